// SPDX-License-Identifier: MIT

use crate::common::ApiResult;
use crate::files::FileHandle;

#[async_trait::async_trait]
impl crate::files::FilesApi for super::HttpApiClient {
    async fn upload_file(&self, bytes: Vec<u8>, name: &str, data_set_id: Option<i64>) -> ApiResult<FileHandle> {
        let mut query: Vec<(&str, String)> = vec![
            ("name", name.to_string()),
            ("externalId", name.to_string()),
            ("overwrite", "true".to_string()),
        ];
        if let Some(ds_id) = data_set_id {
            query.push(("dataSetId", ds_id.to_string()));
        }
        let response = self
            .post("/files")
            .query(&query)
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(bytes)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn retrieve_file(&self, external_id: &str) -> ApiResult<Option<FileHandle>> {
        let response = self.get("/files/byexternalid").query(&[("externalId", external_id)]).send().await?;
        Self::parse_optional(response).await
    }

    async fn retrieve_file_by_id(&self, id: i64) -> ApiResult<FileHandle> {
        let response = self.get(&format!("/files/{}", id)).send().await?;
        Self::parse(response).await
    }

    async fn delete_file(&self, external_id: &str) -> ApiResult<()> {
        let response = self.delete("/files/byexternalid").query(&[("externalId", external_id)]).send().await?;
        Self::check(response).await.map(|_| ())
    }
}
