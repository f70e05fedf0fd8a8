// SPDX-License-Identifier: MIT

use std::time::Duration;

use crate::configuration::archive_name;
use crate::error::ActionResult;

/// The remote service is eventually consistent between a delete and a create
/// of the same external id; give it a short breather.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Tears down the function, its code artifact and optionally its schedules.
/// Absent resources count as success, so a redeploy never trips over a clean
/// slate.
pub async fn remove_function_with_file(
    api: &dyn fnaction_api::FunctionHostApi,
    external_id: &str,
    wipe_schedules: bool,
) -> ActionResult<()> {
    if wipe_schedules {
        remove_schedules(api, external_id).await?;
    }
    delete_function(api, external_id).await?;
    delete_function_file(api, &archive_name(external_id)).await?;
    tokio::time::sleep(SETTLE_DELAY).await;
    Ok(())
}

pub async fn delete_function(api: &dyn fnaction_api::FunctionHostApi, external_id: &str) -> ActionResult<()> {
    match api.retrieve_function(external_id).await? {
        Some(function) => {
            log::info!("Deleting existing function '{}' (ID: {})", external_id, function.id);
            api.delete_function(external_id).await?;
            log::info!("- Delete of function '{}' successful!", external_id);
        }
        None => log::info!("Unable to delete function! External ID '{}' NOT found!", external_id),
    }
    Ok(())
}

/// Deletes the code artifact. A delete failure on a dataset-governed file is
/// logged and swallowed, the upcoming upload-with-overwrite succeeds anyway;
/// on an ungoverned file it is an inconsistent state and propagates.
pub async fn delete_function_file(api: &dyn fnaction_api::FunctionHostApi, file_external_id: &str) -> ActionResult<()> {
    let handle = match api.retrieve_file(file_external_id).await? {
        Some(handle) => handle,
        None => {
            log::info!("Unable to delete file! External ID '{}' NOT found!", file_external_id);
            return Ok(());
        }
    };
    log::info!("Deleting existing file '{}' (ID: {})", file_external_id, handle.id);
    match api.delete_file(file_external_id).await {
        Ok(()) => {
            log::info!("- Delete of file '{}' successful!", file_external_id);
            Ok(())
        }
        Err(err) if handle.data_set_id.is_some() => {
            log::error!(
                "Unable to delete governed file '{}'! Ignoring and continuing, the upload will overwrite it. \
                 Error message from the API: {}",
                file_external_id,
                err
            );
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// No bulk delete exists upstream; each schedule goes one by one. Individual
/// failures are logged and skipped, schedule wipe is best-effort cleanup.
pub async fn remove_schedules(api: &dyn fnaction_api::FunctionHostApi, external_id: &str) -> ActionResult<()> {
    let schedules = api.list_schedules(external_id).await?;
    if schedules.is_empty() {
        return Ok(());
    }
    log::info!("Deleting {} existing schedule(s) for '{}'", schedules.len(), external_id);
    for schedule in schedules {
        match api.delete_schedule(schedule.id).await {
            Ok(()) => log::info!("- Deleted schedule '{}' (ID: {})", schedule.name, schedule.id),
            Err(err) => log::warn!("- Could not delete schedule '{}' (ID: {}): {}", schedule.name, schedule.id, err),
        }
    }
    Ok(())
}
