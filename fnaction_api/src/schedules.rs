// SPDX-License-Identifier: MIT

/// A declarative cron attachment, executed entirely by the remote service.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ScheduleSpec {
    pub name: String,
    pub cron: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleHandle {
    pub id: i64,
    pub name: String,
    pub cron: String,
    pub function_external_id: String,
}

#[async_trait::async_trait]
pub trait SchedulesApi {
    /// Creates one schedule against the function's numeric id. The client
    /// credentials are stored by the service and used at invocation time.
    async fn create_schedule(
        &self,
        function_id: i64,
        credentials: &crate::credentials::ClientCredentials,
        spec: &ScheduleSpec,
    ) -> crate::common::ApiResult<()>;
    async fn list_schedules(&self, function_external_id: &str) -> crate::common::ApiResult<Vec<ScheduleHandle>>;
    async fn delete_schedule(&self, id: i64) -> crate::common::ApiResult<()>;
}
