// SPDX-License-Identifier: MIT

use crate::error::ActionResult;
use fnaction_api::credentials::ClientCredentials;
use fnaction_api::function::Function;
use fnaction_api::schedules::ScheduleSpec;

/// Attaches every schedule to the freshly deployed function. The runtime
/// client credential travels with each schedule so invocations keep working
/// after the deployment token expires.
pub async fn attach_schedules(
    api: &dyn fnaction_api::FunctionHostApi,
    function: &Function,
    schedules: &[ScheduleSpec],
    credentials: &ClientCredentials,
) -> ActionResult<()> {
    if schedules.is_empty() {
        log::info!("No schedules to attach for function '{}'", function.external_id);
        return Ok(());
    }
    log::info!("Attaching {} schedule(s) to function '{}'", schedules.len(), function.external_id);
    for spec in schedules {
        api.create_schedule(function.id, credentials, spec).await?;
        log::info!("- Schedule '{}' (cron: '{}') attached!", spec.name, spec.cron);
    }
    Ok(())
}
