use std::fmt::Display;

use thiserror::Error;

use kcm_config::ConfigError;
use kcm_store::{ApplyError, MetadataClientError, RetryError};

use crate::GenerateError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// unknown credential kind or malformed bootstrap configuration, retrying won't help
    #[error("configuration error: {0}")]
    Configuration(String),
    /// CA material, bootstrap configuration or store not reachable
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("credential generation failed: {0}")]
    GenerationFailed(#[from] GenerateError),
    #[error("reconciliation cancelled")]
    Cancelled,
}

impl ReconcileError {
    /// whether caller should try the whole pass again later
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }

    pub(crate) fn unavailable<E: Display>(what: impl Display, err: E) -> Self {
        Self::DependencyUnavailable(format!("{}: {}", what, err))
    }

    /// map store write failure, errors raised by mutation are passed through
    pub(crate) fn from_write<C>(err: RetryError<ApplyError<C, ReconcileError>>) -> Self
    where
        C: MetadataClientError,
    {
        match err {
            RetryError::Cancelled => Self::Cancelled,
            RetryError::Exhausted { attempts, last } => Self::DependencyUnavailable(format!(
                "write still conflicting after {} attempts: {}",
                attempts, last
            )),
            RetryError::Failed(ApplyError::Mutate(err)) => err,
            RetryError::Failed(err @ ApplyError::IdentityChanged { .. }) => {
                Self::Configuration(err.to_string())
            }
            RetryError::Failed(ApplyError::Client(err)) => Self::unavailable("store write failed", err),
        }
    }
}

impl From<ConfigError> for ReconcileError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::IoError(err) => Self::DependencyUnavailable(err.to_string()),
            other => Self::Configuration(other.to_string()),
        }
    }
}
