// SPDX-License-Identifier: MIT

/// Remote deployment status. Only `Ready` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum FunctionStatus {
    Queued,
    Deploying,
    Ready,
    Failed,
}

impl FunctionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FunctionStatus::Ready | FunctionStatus::Failed)
    }
}

impl std::fmt::Display for FunctionStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionStatus::Queued => write!(fmt, "Queued"),
            FunctionStatus::Deploying => write!(fmt, "Deploying"),
            FunctionStatus::Ready => write!(fmt, "Ready"),
            FunctionStatus::Failed => write!(fmt, "Failed"),
        }
    }
}

/// Error details reported by the service for a failed deployment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct FunctionError {
    pub message: String,
    pub trace: String,
}

/// The function resource as owned by the remote service. The numeric `id` is
/// assigned on creation, `external_id` is the caller's stable key.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub id: i64,
    pub external_id: String,
    pub status: FunctionStatus,
    #[serde(default)]
    pub error: Option<FunctionError>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFunctionRequest {
    pub external_id: String,
    pub name: String,
    pub file_id: i64,
    pub function_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<std::collections::HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub metadata: std::collections::HashMap<String, String>,
}

/// Service-reported bounds for the per-function resource limits.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LimitRange {
    pub min: f64,
    pub max: f64,
}

impl LimitRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FunctionLimits {
    pub cpu: LimitRange,
    pub memory: LimitRange,
}

#[async_trait::async_trait]
pub trait FunctionsApi {
    async fn create_function(&self, request: CreateFunctionRequest) -> crate::common::ApiResult<Function>;
    async fn retrieve_function(&self, external_id: &str) -> crate::common::ApiResult<Option<Function>>;
    async fn retrieve_function_by_id(&self, id: i64) -> crate::common::ApiResult<Function>;
    async fn delete_function(&self, external_id: &str) -> crate::common::ApiResult<()>;
    async fn delete_function_by_id(&self, id: i64) -> crate::common::ApiResult<()>;
    async fn function_limits(&self) -> crate::common::ApiResult<FunctionLimits>;
}
