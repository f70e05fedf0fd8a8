// SPDX-License-Identifier: MIT

use crate::common::ApiResult;
use crate::iam::{Group, TokenInspection};

#[async_trait::async_trait]
impl crate::iam::IamApi for super::HttpApiClient {
    async fn inspect_token(&self) -> ApiResult<TokenInspection> {
        let response = self.get("/token/inspect").send().await?;
        Self::parse(response).await
    }

    async fn list_groups(&self) -> ApiResult<Vec<Group>> {
        // all=false: just the groups of the calling identity.
        let response = self.get("/groups").query(&[("all", "false")]).send().await?;
        let items: super::ItemsResponse<Group> = Self::parse(response).await?;
        Ok(items.items)
    }
}
