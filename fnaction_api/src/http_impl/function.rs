// SPDX-License-Identifier: MIT

use crate::common::ApiResult;
use crate::function::{CreateFunctionRequest, Function, FunctionLimits};

#[async_trait::async_trait]
impl crate::function::FunctionsApi for super::HttpApiClient {
    async fn create_function(&self, request: CreateFunctionRequest) -> ApiResult<Function> {
        let response = self.post("/functions").json(&request).send().await?;
        Self::parse(response).await
    }

    async fn retrieve_function(&self, external_id: &str) -> ApiResult<Option<Function>> {
        let response = self.get("/functions/byexternalid").query(&[("externalId", external_id)]).send().await?;
        Self::parse_optional(response).await
    }

    async fn retrieve_function_by_id(&self, id: i64) -> ApiResult<Function> {
        let response = self.get(&format!("/functions/{}", id)).send().await?;
        Self::parse(response).await
    }

    async fn delete_function(&self, external_id: &str) -> ApiResult<()> {
        let response = self.delete("/functions/byexternalid").query(&[("externalId", external_id)]).send().await?;
        Self::check(response).await.map(|_| ())
    }

    async fn delete_function_by_id(&self, id: i64) -> ApiResult<()> {
        let response = self.delete(&format!("/functions/{}", id)).send().await?;
        Self::check(response).await.map(|_| ())
    }

    async fn function_limits(&self) -> ApiResult<FunctionLimits> {
        let response = self.get("/functions/limits").send().await?;
        Self::parse(response).await
    }
}
