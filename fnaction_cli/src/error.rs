// SPDX-License-Identifier: MIT

/// One itemized report of every missing grant, so the operator gets the
/// complete fix list from a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCapabilityReport {
    pub credential: String,
    pub missing: Vec<String>,
}

impl std::fmt::Display for MissingCapabilityReport {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            fmt,
            "{} credentials missing one (or more) required capabilities:",
            self.credential.to_uppercase()
        )?;
        for (i, item) in self.missing.iter().enumerate() {
            writeln!(fmt, "- {}: {}", i + 1, item)?;
        }
        Ok(())
    }
}

/// The action's error taxonomy. Which class an error lands in decides whether
/// anything retries it: configuration and capability errors never are,
/// `Deploy` is retried by the orchestrator's whole-sequence retry, and raw
/// `Api` errors propagate as-is.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    MissingCapabilities(MissingCapabilityReport),
    #[error("{0}")]
    Deploy(String),
    #[error("{0}")]
    DeployTimeout(String),
    #[error(transparent)]
    Api(#[from] fnaction_api::common::ApiError),
}

impl ActionError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn deploy(message: impl Into<String>) -> Self {
        Self::Deploy(message.into())
    }

    /// Predicate for the orchestrator's whole-sequence retry: only
    /// deploy-class failures (duplicate-id races, transient creation
    /// failures, failed deployments) warrant another delete+upload+create
    /// round.
    pub fn is_retryable_deploy_failure(&self) -> bool {
        matches!(self, ActionError::Deploy(_))
    }
}

pub type ActionResult<T> = Result<T, ActionError>;
