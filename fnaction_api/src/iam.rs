// SPDX-License-Identifier: MIT

/// Result of the token-inspection endpoint: which projects the credential is
/// valid for and the capability snapshot the service resolved for it.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInspection {
    pub subject: String,
    pub projects: Vec<String>,
    /// Raw wire-shape capabilities; parsed into a typed model by the caller.
    #[serde(default)]
    pub capabilities: Vec<serde_json::Value>,
}

/// A permission group the credential belongs to, with its raw capabilities.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<serde_json::Value>,
}

#[async_trait::async_trait]
pub trait IamApi {
    async fn inspect_token(&self) -> crate::common::ApiResult<TokenInspection>;
    /// Only the groups the caller itself belongs to, not all existing ones.
    async fn list_groups(&self) -> crate::common::ApiResult<Vec<Group>>;
}
