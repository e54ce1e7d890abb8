use tracing::{debug, instrument};

use kcm_config::{ConfigurationBlueprint, ReconcilerSettings};
use kcm_types::core::secret::SecretSpec;
use kcm_types::tenant::{KubeconfigStatus, TenantControlPlaneSpec};
use kcm_types::{K8Obj, TYPE_OPAQUE};

use crate::{
    credential_checksum, CertificateKeyPair, CredentialGenerator, CredentialKind,
    CredentialValidator, ReconcileError,
};

/// annotation carrying fingerprint of inputs the credential was generated from
pub const CHECKSUM_ANNOTATION: &str = "checksum";
pub const NAME_LABEL: &str = "controlplane.kcm.io/name";
pub const COMPONENT_LABEL: &str = "controlplane.kcm.io/component";

/// what reconciliation did to the in-memory artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactDecision {
    /// artifact is current, left untouched
    Unchanged { checksum: String },
    /// fresh credential staged, needs to be written
    Staged { checksum: String },
}

impl ArtifactDecision {
    pub fn checksum(&self) -> &str {
        match self {
            Self::Unchanged { checksum } | Self::Staged { checksum } => checksum,
        }
    }
}

/// Decides whether credential must be regenerated and stages it on the artifact.
pub struct ReconciliationEngine<G, V> {
    generator: G,
    validator: V,
    loopback_address: String,
}

impl<G, V> ReconciliationEngine<G, V>
where
    G: CredentialGenerator,
    V: CredentialValidator,
{
    pub fn new(generator: G, validator: V, settings: &ReconcilerSettings) -> Self {
        Self {
            generator,
            validator,
            loopback_address: settings.loopback_address.clone(),
        }
    }

    fn artifact_is_valid(&self, kind: CredentialKind, artifact: &K8Obj<SecretSpec>) -> bool {
        match artifact.header.get_bytes(kind.file_name()) {
            Some(Ok(payload)) => self.validator.is_valid(&payload),
            _ => false,
        }
    }

    /// Bring artifact of `kind` in line with CA and blueprint.
    ///
    /// Fingerprint is taken over CA and stored blueprint checksum only, so it is the
    /// same for every kind of tenant. When it matches `status` and the stored payload
    /// is usable, artifact is not touched. On error artifact is not touched either.
    #[instrument(skip_all, fields(tenant = %tenant.metadata.name, kind = %kind))]
    pub fn reconcile_artifact(
        &self,
        tenant: &K8Obj<TenantControlPlaneSpec>,
        kind: CredentialKind,
        blueprint: &ConfigurationBlueprint,
        ca: &CertificateKeyPair,
        artifact: &mut K8Obj<SecretSpec>,
        status: &KubeconfigStatus,
    ) -> Result<ArtifactDecision, ReconcileError> {
        let customized = kind.customize(blueprint, &self.loopback_address);
        let checksum = credential_checksum(ca, blueprint.checksum());

        if status.checksum == checksum && self.artifact_is_valid(kind, artifact) {
            debug!(%checksum, "credential is up to date");
            return Ok(ArtifactDecision::Unchanged { checksum });
        }

        let payload = self.generator.generate(kind, ca, &customized)?;

        artifact
            .metadata
            .set_controller_reference(
                tenant
                    .metadata
                    .make_owner_reference::<TenantControlPlaneSpec>(),
            )
            .map_err(|err| ReconcileError::Configuration(err.to_string()))?;

        artifact.header.set_single_entry(kind.file_name(), &payload);
        artifact.header.ty = TYPE_OPAQUE.to_owned();
        artifact
            .metadata
            .labels
            .insert(NAME_LABEL.to_owned(), tenant.metadata.name.clone());
        artifact
            .metadata
            .labels
            .insert(COMPONENT_LABEL.to_owned(), kind.resource_name().to_owned());
        artifact
            .metadata
            .annotations
            .insert(CHECKSUM_ANNOTATION.to_owned(), checksum.clone());

        debug!(%checksum, "staged new credential");
        Ok(ArtifactDecision::Staged { checksum })
    }
}
