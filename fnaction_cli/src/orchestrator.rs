// SPDX-License-Identifier: MIT

use std::time::Duration;

use crate::configuration::FunctionConfig;
use crate::deployment::{await_deployment, create_function, PollSettings};
use crate::error::{ActionError, ActionResult};
use crate::package::package_folder;
use crate::removal::remove_function_with_file;
use crate::retry::{retry, RetryPolicy};
use fnaction_api::credentials::ClientCredentials;
use fnaction_api::function::Function;
use fnaction_api::schedules::ScheduleSpec;

/// Whole-sequence retry: a duplicate-external-id race means the previous
/// attempt's partial state must be cleared again, so every new try reruns the
/// full delete-package-upload-create-await sequence from scratch.
pub const DEPLOY_RETRY: RetryPolicy = RetryPolicy {
    tries: 3,
    base_delay: Duration::from_secs(5),
    max_delay: Duration::from_secs(20),
};

/// The file store is eventually consistent; the uploaded flag is polled
/// generously before giving up on the artifact.
pub const UPLOAD_CONFIRM_RETRY: RetryPolicy = RetryPolicy {
    tries: 12,
    base_delay: Duration::from_secs(2),
    max_delay: Duration::from_secs(15),
};

/// A connected schedule client plus what to attach with it.
pub struct SchedulePlan<'a> {
    pub api: &'a dyn fnaction_api::FunctionHostApi,
    pub credentials: ClientCredentials,
    pub schedules: &'a [ScheduleSpec],
}

/// The full deployment flow. Both credentials are capability-gated up front,
/// so an under-permissioned schedule client surfaces before anything is torn
/// down or deployed; only then runs the retrying deploy sequence, schedule
/// attachment and the optional artifact cleanup.
pub async fn deploy_with_schedules(
    api: &dyn fnaction_api::FunctionHostApi,
    project: &str,
    config: &FunctionConfig,
    schedule_plan: Option<SchedulePlan<'_>>,
    settings: PollSettings,
) -> ActionResult<Function> {
    crate::access::verify_deploy_capabilities(api, project, config.data_set_id).await?;
    if let Some(plan) = &schedule_plan {
        crate::access::verify_schedule_capabilities(plan.api, project).await?;
    }
    warn_on_limit_violations(api, config).await;

    let function = upload_and_create_function(api, config, settings).await?;

    if let Some(plan) = schedule_plan {
        crate::schedule::attach_schedules(plan.api, &function, plan.schedules, &plan.credentials).await?;
    }
    if config.post_deploy_cleanup {
        crate::cleanup::delete_deployment_artifact(api, &config.external_id).await;
    }
    Ok(function)
}

/// Removes any stale function and artifact, packages the code folder, uploads
/// the archive, creates the function and awaits its deployment. Only
/// deploy-class failures are retried; configuration and permission errors are
/// permanent and surface immediately.
pub async fn upload_and_create_function(
    api: &dyn fnaction_api::FunctionHostApi,
    config: &FunctionConfig,
    settings: PollSettings,
) -> ActionResult<Function> {
    retry(DEPLOY_RETRY, ActionError::is_retryable_deploy_failure, || {
        deploy_once(api, config, settings)
    })
    .await
}

async fn deploy_once(
    api: &dyn fnaction_api::FunctionHostApi,
    config: &FunctionConfig,
    settings: PollSettings,
) -> ActionResult<Function> {
    remove_function_with_file(api, &config.external_id, config.remove_schedules).await?;

    let archive = package_folder(&config.folder, config.common_folder.as_deref())?;
    let file_id = upload_archive(api, config, archive).await?;
    let function = create_function(api, file_id, config).await?;

    if !config.await_deployment_success {
        log::warn!(
            "Awaiting successful deployment of function '{}' was skipped (await_deployment_success=false)! \
             Remember to verify manually that the function deployed.",
            config.external_id
        );
        return Ok(function);
    }
    await_deployment(api, function, config.deploy_timeout, settings).await
}

async fn upload_archive(api: &dyn fnaction_api::FunctionHostApi, config: &FunctionConfig, archive: Vec<u8>) -> ActionResult<i64> {
    let name = config.archive_name();
    log::info!("Uploading code from '{}' to the file store as '{}'", config.folder.display(), name);

    if let Some(ds_id) = config.data_set_id {
        let dataset = api
            .retrieve_dataset(ds_id)
            .await?
            .ok_or_else(|| ActionError::config(format!("no data set exists with id: {}", ds_id)))?;
        log::info!(
            "- Using data set '{}' (ID: {}) to govern the file (write protected: {})",
            dataset.external_id.as_deref().unwrap_or("<no external id>"),
            ds_id,
            dataset.write_protected
        );
    } else {
        log::info!("- No data set will be used to govern the function zip file!");
    }

    let handle = api.upload_file(archive, &name, config.data_set_id).await?;
    retry(UPLOAD_CONFIRM_RETRY, |e: &ActionError| matches!(e, ActionError::Deploy(_)), || async {
        let current = api.retrieve_file_by_id(handle.id).await?;
        if current.uploaded {
            Ok(())
        } else {
            log::info!("- File (ID: {}) not yet uploaded...", handle.id);
            Err(ActionError::deploy(format!("failed to upload file '{}' to the remote store", name)))
        }
    })
    .await?;
    log::info!("- File uploaded successfully ('{}')!", name);
    Ok(handle.id)
}

/// Remote-reported resource bounds are advisory: a limit outside them is
/// logged, the service clamps or rejects on its own terms.
pub async fn warn_on_limit_violations(api: &dyn fnaction_api::FunctionHostApi, config: &FunctionConfig) {
    let limits = match api.function_limits().await {
        Ok(limits) => limits,
        Err(err) => {
            log::debug!("Could not fetch function resource limits: {}", err);
            return;
        }
    };
    if let Some(cpu) = config.cpu {
        if !limits.cpu.contains(cpu) {
            log::warn!("Requested cpu {} outside the supported range [{}, {}]", cpu, limits.cpu.min, limits.cpu.max);
        }
    }
    if let Some(memory) = config.memory {
        if !limits.memory.contains(memory) {
            log::warn!(
                "Requested memory {} outside the supported range [{}, {}]",
                memory,
                limits.memory.min,
                limits.memory.max
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Call, MockApi};
    use fnaction_api::common::ApiError;
    use fnaction_api::function::FunctionStatus;
    use fnaction_api::iam::{Group, TokenInspection};

    fn acl(name: &str, actions: &[&str], scope: serde_json::Value) -> serde_json::Value {
        serde_json::json!({ name: { "actions": actions, "scope": scope } })
    }

    fn grant(api: &MockApi, capabilities: Vec<serde_json::Value>) {
        let mut state = api.state.lock().unwrap();
        state.token = Some(TokenInspection {
            subject: "svc-account".to_string(),
            projects: vec!["prod".to_string()],
            capabilities: capabilities.clone(),
        });
        state.groups = vec![Group {
            id: 1,
            name: Some("deployers".to_string()),
            capabilities,
        }];
    }

    fn grant_all(api: &MockApi) {
        grant(
            api,
            vec![
                acl("functionsAcl", &["READ", "WRITE"], serde_json::json!({"all": {}})),
                acl("sessionsAcl", &["CREATE"], serde_json::json!({"all": {}})),
                acl("filesAcl", &["READ", "WRITE"], serde_json::json!({"all": {}})),
            ],
        );
    }

    fn runtime_credentials() -> ClientCredentials {
        ClientCredentials {
            client_id: "runtime-id".to_string(),
            client_secret: "runtime-secret".to_string(),
        }
    }

    fn config_in(dir: &std::path::Path) -> FunctionConfig {
        std::fs::write(dir.join("handler.py"), "def handle():\n    pass\n").unwrap();
        FunctionConfig {
            external_id: "greeter".to_string(),
            folder: dir.to_path_buf(),
            file: "handler.py".to_string(),
            common_folder: None,
            secrets: None,
            cpu: None,
            memory: None,
            data_set_id: None,
            metadata: Default::default(),
            owner: None,
            description: None,
            deploy_timeout: Duration::from_secs(60),
            await_deployment_success: true,
            post_deploy_cleanup: false,
            remove_schedules: true,
        }
    }

    fn fast_polls() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(10),
            progress_every: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_deploy_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockApi::new();
        api.state.lock().unwrap().status_sequence.push_back(FunctionStatus::Ready);

        let function = upload_and_create_function(&api, &config_in(dir.path()), fast_polls()).await.unwrap();
        assert_eq!(function.status, FunctionStatus::Ready);
        assert_eq!(api.count_calls(|c| matches!(c, Call::UploadFile(_))), 1);
        assert_eq!(api.count_calls(|c| matches!(c, Call::CreateFunction(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_function_is_removed_before_redeploy() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockApi::new();
        api.insert_function("greeter", FunctionStatus::Ready);
        api.insert_file("greeter.zip", None);
        api.state.lock().unwrap().status_sequence.push_back(FunctionStatus::Ready);

        upload_and_create_function(&api, &config_in(dir.path()), fast_polls()).await.unwrap();
        assert_eq!(api.count_calls(|c| matches!(c, Call::DeleteFunction(_))), 1);
        assert_eq!(api.count_calls(|c| matches!(c, Call::DeleteFile(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_id_race_retries_whole_sequence_then_surfaces_original_error() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockApi::new();
        {
            let mut state = api.state.lock().unwrap();
            for _ in 0..DEPLOY_RETRY.tries {
                state
                    .create_function_errors
                    .push_back(ApiError::status(409, "function with external id 'greeter' already exists"));
            }
        }
        let err = upload_and_create_function(&api, &config_in(dir.path()), fast_polls()).await.unwrap_err();
        // The original deploy-class error, not a retry wrapper.
        assert!(matches!(&err, ActionError::Deploy(msg) if msg.contains("already exists")), "got: {}", err);
        assert_eq!(api.count_calls(|c| matches!(c, Call::CreateFunction(_))), DEPLOY_RETRY.tries as usize);
        // Each attempt reran the removal step too.
        assert_eq!(api.count_calls(|c| matches!(c, Call::UploadFile(_))), DEPLOY_RETRY.tries as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_error_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockApi::new();
        api.state
            .lock()
            .unwrap()
            .create_function_errors
            .push_back(ApiError::status(403, "forbidden"));
        let err = upload_and_create_function(&api, &config_in(dir.path()), fast_polls()).await.unwrap_err();
        assert!(matches!(err, ActionError::Api(_)), "got: {}", err);
        assert_eq!(api.count_calls(|c| matches!(c, Call::CreateFunction(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_confirmation_waits_for_the_uploaded_flag() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockApi::new();
        {
            let mut state = api.state.lock().unwrap();
            state.upload_ready_after = 3;
            state.status_sequence.push_back(FunctionStatus::Ready);
        }
        let function = upload_and_create_function(&api, &config_in(dir.path()), fast_polls()).await.unwrap();
        assert_eq!(function.status, FunctionStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_dataset_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockApi::new();
        let mut config = config_in(dir.path());
        config.data_set_id = Some(42);
        let err = upload_and_create_function(&api, &config, fast_polls()).await.unwrap_err();
        assert!(matches!(err, ActionError::Config(_)), "got: {}", err);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_credential_gate_runs_before_any_deploy_step() {
        let dir = tempfile::tempdir().unwrap();
        let deploy_api = MockApi::new();
        grant_all(&deploy_api);
        // Schedule client can read functions but neither write them nor open sessions.
        let schedule_api = MockApi::new();
        grant(&schedule_api, vec![acl("functionsAcl", &["READ"], serde_json::json!({"all": {}}))]);

        let schedules = [ScheduleSpec {
            name: "greeter:daily".to_string(),
            cron: "0 0 * * *".to_string(),
            data: None,
        }];
        let plan = SchedulePlan {
            api: &schedule_api,
            credentials: runtime_credentials(),
            schedules: &schedules,
        };
        let err = deploy_with_schedules(&deploy_api, "prod", &config_in(dir.path()), Some(plan), fast_polls())
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::MissingCapabilities(_)), "got: {}", err);
        // Nothing was torn down, uploaded or created.
        assert_eq!(
            deploy_api.count_calls(|c| matches!(c, Call::DeleteFunction(_) | Call::UploadFile(_) | Call::CreateFunction(_))),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedules_attached_after_successful_deploy() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockApi::new();
        grant_all(&api);
        api.state.lock().unwrap().status_sequence.push_back(FunctionStatus::Ready);

        let schedules = [ScheduleSpec {
            name: "greeter:daily".to_string(),
            cron: "0 0 * * *".to_string(),
            data: None,
        }];
        let plan = SchedulePlan {
            api: &api,
            credentials: runtime_credentials(),
            schedules: &schedules,
        };
        deploy_with_schedules(&api, "prod", &config_in(dir.path()), Some(plan), fast_polls()).await.unwrap();

        let calls = api.calls();
        let created = calls.iter().position(|c| matches!(c, Call::CreateFunction(_)));
        let scheduled = calls.iter().position(|c| matches!(c, Call::CreateSchedule(_)));
        assert!(created.unwrap() < scheduled.unwrap(), "calls were: {:?}", calls);
        assert_eq!(api.state.lock().unwrap().schedules.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_awaiting_can_be_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockApi::new();
        let mut config = config_in(dir.path());
        config.await_deployment_success = false;
        let function = upload_and_create_function(&api, &config, fast_polls()).await.unwrap();
        assert_eq!(function.status, FunctionStatus::Queued);
    }
}
