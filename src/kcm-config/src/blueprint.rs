use std::net::IpAddr;

use serde::Deserialize;
use serde::Serialize;

use crate::ConfigError;

const DEFAULT_BIND_PORT: u16 = 6443;
const DEFAULT_VALIDITY_DAYS: u32 = 365;

fn default_bind_port() -> u16 {
    DEFAULT_BIND_PORT
}

fn default_validity_days() -> u32 {
    DEFAULT_VALIDITY_DAYS
}

/// address API server of tenant is advertised on
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    pub advertise_address: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
}

impl ApiEndpoint {
    /// https url of endpoint, IPv6 addresses are bracketed
    pub fn server_url(&self) -> String {
        match self.advertise_address.parse::<IpAddr>() {
            Ok(IpAddr::V6(address)) => format!("https://[{}]:{}", address, self.bind_port),
            _ => format!("https://{}:{}", self.advertise_address, self.bind_port),
        }
    }
}

/// bootstrap parameters of tenant cluster as stored
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfiguration {
    pub cluster_name: String,
    #[serde(default)]
    pub kubernetes_version: String,
    #[serde(rename = "localAPIEndpoint")]
    pub local_api_endpoint: ApiEndpoint,
    #[serde(default = "default_validity_days")]
    pub certificates_validity_days: u32,
}

impl BootstrapConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_name.trim().is_empty() {
            return Err(ConfigError::InvalidBlueprint(
                "cluster name is empty".to_owned(),
            ));
        }

        let address = &self.local_api_endpoint.advertise_address;
        if address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::InvalidBlueprint(format!(
                "advertise address '{}' is not an IP address",
                address
            )));
        }

        if self.local_api_endpoint.bind_port == 0 {
            return Err(ConfigError::InvalidBlueprint(
                "bind port must not be 0".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Bootstrap configuration together with fingerprint of its stored form.
///
/// Checksum always describes the document as it was fetched; customizations applied
/// afterwards don't change it.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ConfigurationBlueprint {
    configuration: BootstrapConfiguration,
    checksum: String,
}

impl ConfigurationBlueprint {
    pub fn new(configuration: BootstrapConfiguration, checksum: String) -> Self {
        Self {
            configuration,
            checksum,
        }
    }

    /// parse and validate yaml document
    pub fn from_yaml(bytes: &[u8], checksum: String) -> Result<Self, ConfigError> {
        let configuration: BootstrapConfiguration = serde_yaml::from_slice(bytes)?;
        configuration.validate()?;
        Ok(Self::new(configuration, checksum))
    }

    pub fn configuration(&self) -> &BootstrapConfiguration {
        &self.configuration
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn cluster_name(&self) -> &str {
        &self.configuration.cluster_name
    }

    pub fn server_url(&self) -> String {
        self.configuration.local_api_endpoint.server_url()
    }

    /// copy of blueprint advertising API server on different address
    pub fn with_advertise_address(&self, address: &str) -> Self {
        let mut blueprint = self.clone();
        blueprint.configuration.local_api_endpoint.advertise_address = address.to_owned();
        blueprint
    }
}
