// SPDX-License-Identifier: MIT

pub mod datasets;
pub mod files;
pub mod function;
pub mod iam;
pub mod schedules;

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Wrapper for the service's list envelope: `{"items": [...]}`.
#[derive(serde::Deserialize)]
pub(crate) struct ItemsResponse<T> {
    pub items: Vec<T>,
}

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for the function-hosting service.
///
/// One instance per credential; the bearer token is acquired once in
/// `connect` (a deployment run is far shorter than the token lifetime).
#[derive(Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
    project: String,
    token: String,
}

impl HttpApiClient {
    pub async fn connect(credentials: &crate::credentials::Credentials) -> crate::common::ApiResult<Self> {
        let http = reqwest::Client::new();
        let params = [
            ("grant_type", "client_credentials".to_string()),
            ("client_id", credentials.client_id.clone()),
            ("client_secret", credentials.client_secret.clone()),
            ("scope", credentials.scopes().join(" ")),
        ];
        let response = http
            .post(credentials.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| crate::common::ApiError::Auth(format!("token request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(crate::common::ApiError::Auth(format!(
                "token endpoint returned status {} for client id '{}'",
                response.status(),
                credentials.client_id
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| crate::common::ApiError::Auth(format!("malformed token response: {}", e)))?;
        log::debug!("Acquired access token for project '{}'", credentials.project);
        Ok(Self {
            http,
            base_url: credentials.base_url(),
            project: credentials.project.clone(),
            token: token.access_token,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/projects/{}{}", self.base_url, self.project, path)
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path)).bearer_auth(&self.token)
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path)).bearer_auth(&self.token)
    }

    pub(crate) fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.delete(self.url(path)).bearer_auth(&self.token)
    }

    /// Maps a non-2xx response to `ApiError::Status`, extracting the service's
    /// error message when the body carries one.
    pub(crate) async fn check(response: reqwest::Response) -> crate::common::ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let code = status.as_u16();
        let raw = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&raw) {
            Ok(envelope) => envelope.error.message,
            Err(_) if !raw.is_empty() => raw,
            Err(_) => status.to_string(),
        };
        Err(crate::common::ApiError::Status { code, message })
    }

    pub(crate) async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> crate::common::ApiResult<T> {
        let checked = Self::check(response).await?;
        checked
            .json::<T>()
            .await
            .map_err(|e| crate::common::ApiError::Payload(e.to_string()))
    }

    /// Variant of `parse` for retrieve-by-external-id endpoints where a 404 is
    /// a regular outcome, not an error.
    pub(crate) async fn parse_optional<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> crate::common::ApiResult<Option<T>> {
        match Self::parse::<T>(response).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
