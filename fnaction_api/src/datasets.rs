// SPDX-License-Identifier: MIT

/// An access-governance boundary a file can be placed under. Modifying files
/// in a write-protected dataset requires the elevated OWNER action.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    pub write_protected: bool,
}

#[async_trait::async_trait]
pub trait DatasetsApi {
    async fn retrieve_dataset(&self, id: i64) -> crate::common::ApiResult<Option<Dataset>>;
}
