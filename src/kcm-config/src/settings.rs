use std::fs::File;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::ConfigError;

pub const DEFAULT_LOOPBACK_ADDRESS: &str = "127.0.0.1";

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConflictRetrySettings {
    pub attempts: usize,
    pub backoff_millis: u64,
}

impl Default for ConflictRetrySettings {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff_millis: 10,
        }
    }
}

impl ConflictRetrySettings {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_millis)
    }
}

/// settings of credential reconciliation
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcilerSettings {
    /// address co-located components reach API server on
    pub loopback_address: String,
    pub conflict_retry: ConflictRetrySettings,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            loopback_address: DEFAULT_LOOPBACK_ADDRESS.to_owned(),
            conflict_retry: ConflictRetrySettings::default(),
        }
    }
}

impl ReconcilerSettings {
    pub fn from_file<T: AsRef<Path>>(path: T) -> Result<Self, ConfigError> {
        debug!("loading reconciler settings from {}", path.as_ref().display());
        let file = File::open(path.as_ref())?;
        let settings: Self = serde_yaml::from_reader(file)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_slice(bytes)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.loopback_address.parse::<IpAddr>() {
            Ok(address) if address.is_loopback() => {}
            _ => {
                return Err(ConfigError::Other(format!(
                    "'{}' is not a loopback address",
                    self.loopback_address
                )))
            }
        }

        if self.conflict_retry.attempts == 0 {
            return Err(ConfigError::Other(
                "conflict retry attempts must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
