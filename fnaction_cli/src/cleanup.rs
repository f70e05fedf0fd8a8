// SPDX-License-Identifier: MIT

use crate::configuration::archive_name;

/// Removes the uploaded code artifact once the function is running; the
/// service keeps its own copy. Opt-in, and never fatal: the deployment already
/// succeeded, a leftover zip only costs storage.
pub async fn delete_deployment_artifact(api: &dyn fnaction_api::FunctionHostApi, external_id: &str) {
    let name = archive_name(external_id);
    log::info!("Post-deploy cleanup: removing uploaded artifact '{}'", name);
    match api.retrieve_file(&name).await {
        Ok(Some(_)) => match api.delete_file(&name).await {
            Ok(()) => log::info!("- Artifact '{}' removed!", name),
            Err(err) => log::warn!("- Could not remove artifact '{}': {}", name, err),
        },
        Ok(None) => log::info!("- Artifact '{}' already gone, nothing to clean up", name),
        Err(err) => log::warn!("- Could not look up artifact '{}': {}", name, err),
    }
}
