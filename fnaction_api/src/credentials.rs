// SPDX-License-Identifier: MIT

/// OAuth2 client-credentials for one identity against one project.
///
/// Passed by value to `http_impl::HttpApiClient::connect`; nothing inherits
/// from this, components that need a client get one injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub cluster: String,
    pub project: String,
}

impl Credentials {
    pub fn base_url(&self) -> String {
        format!("https://{}.functionhost.dev", self.cluster)
    }

    pub fn token_url(&self) -> String {
        format!("https://login.microsoftonline.com/{}/oauth2/v2.0/token", self.tenant_id)
    }

    pub fn scopes(&self) -> Vec<String> {
        vec![format!("{}/.default", self.base_url())]
    }

    /// The subset handed to the remote service when creating a schedule, used
    /// by the service at invocation time.
    pub fn client_credentials(&self) -> ClientCredentials {
        ClientCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}
