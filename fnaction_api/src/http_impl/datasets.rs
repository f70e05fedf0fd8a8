// SPDX-License-Identifier: MIT

use crate::common::ApiResult;
use crate::datasets::Dataset;

#[async_trait::async_trait]
impl crate::datasets::DatasetsApi for super::HttpApiClient {
    async fn retrieve_dataset(&self, id: i64) -> ApiResult<Option<Dataset>> {
        let response = self.get(&format!("/datasets/{}", id)).send().await?;
        Self::parse_optional(response).await
    }
}
