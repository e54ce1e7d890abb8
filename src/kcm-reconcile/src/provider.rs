use async_trait::async_trait;
use tracing::debug;

use kcm_config::ConfigurationBlueprint;
use kcm_store::{MetadataClient, SharedClient};
use kcm_types::core::secret::SecretSpec;
use kcm_types::tenant::TenantControlPlaneSpec;
use kcm_types::{ItemMeta, K8Obj};

use crate::{blueprint_checksum, ReconcileError, CHECKSUM_ANNOTATION};

pub const BOOTSTRAP_CONFIG_KEY: &str = "bootstrap.yaml";

/// supplies bootstrap configuration of tenant
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    async fn blueprint(
        &self,
        tenant: &K8Obj<TenantControlPlaneSpec>,
    ) -> Result<ConfigurationBlueprint, ReconcileError>;
}

/// Reads bootstrap configuration from secret referenced by tenant status.
///
/// Checksum annotation of the secret is used as blueprint checksum when present,
/// otherwise it is computed from the stored document.
pub struct StoredBlueprintProvider<C> {
    client: SharedClient<C>,
}

impl<C> StoredBlueprintProvider<C> {
    pub fn new(client: SharedClient<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C> ConfigurationProvider for StoredBlueprintProvider<C>
where
    C: MetadataClient,
{
    async fn blueprint(
        &self,
        tenant: &K8Obj<TenantControlPlaneSpec>,
    ) -> Result<ConfigurationBlueprint, ReconcileError> {
        let secret_name = &tenant.status.bootstrap.secret_name;
        if secret_name.is_empty() {
            return Err(ReconcileError::DependencyUnavailable(format!(
                "bootstrap configuration of tenant {} is not stored yet",
                tenant.item()
            )));
        }

        let item = ItemMeta::new(secret_name.as_str(), tenant.metadata.namespace.as_str());
        let secret = self
            .client
            .retrieve_item::<SecretSpec, _>(&item)
            .await
            .map_err(|err| {
                ReconcileError::unavailable(
                    format!("cannot retrieve bootstrap configuration {}", item),
                    err,
                )
            })?;

        let document = match secret.header.get_bytes(BOOTSTRAP_CONFIG_KEY) {
            Some(Ok(document)) => document,
            Some(Err(err)) => {
                return Err(ReconcileError::Configuration(format!(
                    "'{}' of {} is not base64: {}",
                    BOOTSTRAP_CONFIG_KEY, item, err
                )))
            }
            None => {
                return Err(ReconcileError::Configuration(format!(
                    "{} has no '{}'",
                    item, BOOTSTRAP_CONFIG_KEY
                )))
            }
        };

        let checksum = match secret.metadata.annotations.get(CHECKSUM_ANNOTATION) {
            Some(checksum) if !checksum.is_empty() => checksum.clone(),
            _ => blueprint_checksum(&document),
        };
        debug!(%item, %checksum, "loaded bootstrap configuration");

        Ok(ConfigurationBlueprint::from_yaml(&document, checksum)?)
    }
}
