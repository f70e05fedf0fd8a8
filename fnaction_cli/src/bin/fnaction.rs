// SPDX-License-Identifier: MIT

use anyhow::Context;

use fnaction_api::http_impl::HttpApiClient;
use fnaction_cli::ci::{self, CiSystem};
use fnaction_cli::configuration::{deploy_credentials, DeleteConfig, EnvSource, FunctionConfig, ScheduleConfig};
use fnaction_cli::deployment::PollSettings;
use fnaction_cli::orchestrator::{self, SchedulePlan};
use fnaction_cli::removal;

#[tokio::main]
async fn main() {
    let ci = CiSystem::detect();
    ci::init_logging(ci);
    if let Err(err) = run(ci).await {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(ci: CiSystem) -> anyhow::Result<()> {
    let env = EnvSource::from_env();

    // Remove-only runs skip everything that needs the code folder to exist.
    let delete = DeleteConfig::from_env(&env)?;
    if delete.remove_only {
        let credentials = deploy_credentials(&env)?;
        let api = HttpApiClient::connect(&credentials)
            .await
            .with_context(|| format!("could not sign in to cluster '{}'", credentials.cluster))?;
        log::info!("Running in remove-only mode, tearing down function '{}'", delete.external_id);
        removal::remove_function_with_file(&api, &delete.external_id, true).await?;
        ci::emit_output(ci, "function_external_id", &delete.external_id);
        return Ok(());
    }

    let config = FunctionConfig::from_env(&env)?;
    let schedules = ScheduleConfig::from_env(&env, &config)?;

    let credentials = deploy_credentials(&env)?;
    let api = HttpApiClient::connect(&credentials)
        .await
        .with_context(|| format!("could not sign in to cluster '{}'", credentials.cluster))?;

    // Connect the schedule client up front: its capability gate must pass
    // before anything is torn down or deployed.
    let schedule_api = match &schedules.credentials {
        Some(schedule_credentials) => Some(
            HttpApiClient::connect(schedule_credentials)
                .await
                .context("could not sign in with the schedule credentials")?,
        ),
        None => None,
    };
    let plan = match (&schedule_api, &schedules.credentials) {
        (Some(schedule_api), Some(schedule_credentials)) => Some(SchedulePlan {
            api: schedule_api,
            credentials: schedule_credentials.client_credentials(),
            schedules: &schedules.schedules,
        }),
        _ => None,
    };

    let function = orchestrator::deploy_with_schedules(&api, &credentials.project, &config, plan, PollSettings::default()).await?;

    ci::emit_output(ci, "function_external_id", &function.external_id);
    log::info!("Deployment of function '{}' complete!", function.external_id);
    Ok(())
}
