// SPDX-License-Identifier: MIT

/// Error returned by every remote call.
///
/// The remote service speaks plain HTTP, so the variants keep the status code
/// around: the deployment logic decides what is transient, what is a
/// duplicate-id race and what is permanent based on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("remote API rejected the request (status {code}): {message}")]
    Status { code: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not authenticate: {0}")]
    Auth(String),
    #[error("unexpected response payload: {0}")]
    Payload(String),
}

impl ApiError {
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Server-side hiccups worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Status { code, .. } => *code >= 500 || *code == 429 || *code == 408,
            ApiError::Transport(_) => true,
            ApiError::Auth(_) | ApiError::Payload(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// A create racing a just-issued delete of the same external id.
    pub fn is_duplicate(&self) -> bool {
        self.status_code() == Some(409)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::Status {
                code: status.as_u16(),
                message: err.to_string(),
            },
            None => ApiError::Transport(err.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
