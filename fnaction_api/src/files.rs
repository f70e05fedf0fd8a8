// SPDX-License-Identifier: MIT

/// A code artifact in the remote file store.
///
/// `uploaded` is the store's eventual-consistency flag: the metadata record
/// exists as soon as the upload call returns, the content may lag behind.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    pub id: i64,
    pub external_id: String,
    pub uploaded: bool,
    #[serde(default)]
    pub data_set_id: Option<i64>,
}

#[async_trait::async_trait]
pub trait FilesApi {
    /// Uploads `bytes` under `name`, overwriting any previous artifact with
    /// the same name, optionally governed by a dataset.
    async fn upload_file(&self, bytes: Vec<u8>, name: &str, data_set_id: Option<i64>) -> crate::common::ApiResult<FileHandle>;
    async fn retrieve_file(&self, external_id: &str) -> crate::common::ApiResult<Option<FileHandle>>;
    async fn retrieve_file_by_id(&self, id: i64) -> crate::common::ApiResult<FileHandle>;
    async fn delete_file(&self, external_id: &str) -> crate::common::ApiResult<()>;
}
