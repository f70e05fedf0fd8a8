// SPDX-License-Identifier: MIT

use std::time::Duration;

use crate::configuration::FunctionConfig;
use crate::error::{ActionError, ActionResult};
use crate::retry::{retry, RetryPolicy};
use fnaction_api::function::{Function, FunctionStatus};

/// Bounded retry for the creation call itself; distinct from the
/// orchestrator's whole-sequence retry.
pub const CREATE_RETRY: RetryPolicy = RetryPolicy {
    tries: 3,
    base_delay: Duration::from_secs(5),
    max_delay: Duration::from_secs(30),
};

/// Cadences of the deployment-await loop. Injectable so tests can shrink them.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub progress_every: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            progress_every: Duration::from_secs(90),
        }
    }
}

/// Creates the function resource referencing the uploaded artifact. Transient
/// rejections are retried here with backoff; a duplicate-external-id race or
/// spent retries surface as a deploy-class failure so the orchestrator can
/// rerun the whole delete-upload-create sequence.
pub async fn create_function(
    api: &dyn fnaction_api::FunctionHostApi,
    file_id: i64,
    config: &FunctionConfig,
) -> ActionResult<Function> {
    log::info!("Trying to create function '{}'...", config.external_id);
    match &config.secrets {
        Some(secrets) => log::info!(
            "...with {} extra secret(s) named: {:?}",
            secrets.len(),
            secrets.keys().collect::<Vec<_>>()
        ),
        None => log::info!("...with no extra secrets"),
    }

    let function = retry(CREATE_RETRY, |e: &fnaction_api::common::ApiError| e.is_transient(), || async {
        api.create_function(config.create_request(file_id)).await
    })
    .await
    .map_err(|err| {
        if err.is_duplicate() || err.is_transient() {
            ActionError::deploy(format!("remote rejected creation of function '{}': {}", config.external_id, err))
        } else {
            ActionError::Api(err)
        }
    })?;

    log::info!("Function '{}' created successfully! (ID: {})", function.external_id, function.id);
    Ok(function)
}

/// Polls the remote status until terminal or until the timeout budget is
/// spent. On timeout a best-effort cancellation delete is attempted and its
/// failure swallowed; the timeout error is always the one surfaced.
pub async fn await_deployment(
    api: &dyn fnaction_api::FunctionHostApi,
    mut function: Function,
    timeout: Duration,
    settings: PollSettings,
) -> ActionResult<Function> {
    let started = tokio::time::Instant::now();
    let mut next_progress_log = settings.progress_every;

    loop {
        let elapsed = started.elapsed();
        match function.status {
            FunctionStatus::Ready => {
                log::info!("Function deployment successful! Deployment took {} s", elapsed.as_secs());
                return Ok(function);
            }
            FunctionStatus::Failed => {
                let error = function.error.unwrap_or_else(|| fnaction_api::function::FunctionError {
                    message: "unknown error".to_string(),
                    trace: String::new(),
                });
                let err_msg = format!("Error message: {}.\nTrace: {}", error.message, error.trace);
                log::warn!("Deployment failed after {} s! {}", elapsed.as_secs(), err_msg);
                return Err(ActionError::deploy(err_msg));
            }
            FunctionStatus::Queued | FunctionStatus::Deploying => {}
        }
        if elapsed >= timeout {
            break;
        }
        if elapsed >= next_progress_log {
            next_progress_log += settings.progress_every;
            log::info!(
                "- Deployment in progress, current status: '{}', time elapsed: {} s",
                function.status,
                elapsed.as_secs()
            );
        }
        tokio::time::sleep(settings.interval).await;
        function = api.retrieve_function_by_id(function.id).await?;
    }

    // Cancel what we can; the timeout is the error either way.
    if let Err(err) = api.delete_function_by_id(function.id).await {
        log::debug!("Cancellation delete of function {} failed: {}", function.id, err);
    }
    let timeout_msg = format!(
        "Function '{}' (ID: {}) did not deploy within the given timeout limit: {} s, and was (attempted) cancelled. \
         The limit can be raised with the 'deploy_timeout' input.",
        function.external_id,
        function.id,
        timeout.as_secs()
    );
    log::error!("{}", timeout_msg);
    Err(ActionError::DeployTimeout(timeout_msg))
}
