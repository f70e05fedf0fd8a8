// SPDX-License-Identifier: MIT

use crate::common::ApiResult;
use crate::schedules::{ScheduleHandle, ScheduleSpec};

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateScheduleRequest<'a> {
    function_id: i64,
    client_credentials: &'a crate::credentials::ClientCredentials,
    #[serde(flatten)]
    spec: &'a ScheduleSpec,
}

#[async_trait::async_trait]
impl crate::schedules::SchedulesApi for super::HttpApiClient {
    async fn create_schedule(
        &self,
        function_id: i64,
        credentials: &crate::credentials::ClientCredentials,
        spec: &ScheduleSpec,
    ) -> ApiResult<()> {
        let body = CreateScheduleRequest {
            function_id,
            client_credentials: credentials,
            spec,
        };
        let response = self.post("/functions/schedules").json(&body).send().await?;
        Self::check(response).await.map(|_| ())
    }

    async fn list_schedules(&self, function_external_id: &str) -> ApiResult<Vec<ScheduleHandle>> {
        let response = self
            .get("/functions/schedules")
            .query(&[("functionExternalId", function_external_id)])
            .send()
            .await?;
        let items: super::ItemsResponse<ScheduleHandle> = Self::parse(response).await?;
        Ok(items.items)
    }

    async fn delete_schedule(&self, id: i64) -> ApiResult<()> {
        let response = self.delete(&format!("/functions/schedules/{}", id)).send().await?;
        Self::check(response).await.map(|_| ())
    }
}
