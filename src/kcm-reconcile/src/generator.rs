use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tracing::debug;

use kcm_config::{
    Cluster, ClusterDetail, ConfigError, ConfigurationBlueprint, Context, ContextDetail,
    KubeConfig, User, UserDetail,
};

use crate::{CertificateKeyPair, ClientIdentity, CredentialKind};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("CA certificate or key is empty")]
    MissingCa,
    #[error("signing client certificate for '{identity}' failed: {reason}")]
    Signing { identity: String, reason: String },
    #[error("rendering kubeconfig failed: {0}")]
    Render(#[from] ConfigError),
}

/// PEM encoded client certificate and its key
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCertificate {
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
}

/// Issues client certificates signed by CA.
/// Implemented outside of this crate.
pub trait ClientCertificateSigner: Send + Sync {
    fn sign(
        &self,
        identity: &ClientIdentity,
        ca: &CertificateKeyPair,
        validity_days: u32,
    ) -> Result<ClientCertificate, GenerateError>;
}

/// Produces credential payload for kind from CA and already customized blueprint
pub trait CredentialGenerator: Send + Sync {
    fn generate(
        &self,
        kind: CredentialKind,
        ca: &CertificateKeyPair,
        blueprint: &ConfigurationBlueprint,
    ) -> Result<Vec<u8>, GenerateError>;
}

/// renders kubeconfig with embedded client certificate
#[derive(Debug, Clone)]
pub struct KubeconfigGenerator<S> {
    signer: S,
}

impl<S> KubeconfigGenerator<S> {
    pub fn new(signer: S) -> Self {
        Self { signer }
    }
}

impl<S> CredentialGenerator for KubeconfigGenerator<S>
where
    S: ClientCertificateSigner,
{
    fn generate(
        &self,
        kind: CredentialKind,
        ca: &CertificateKeyPair,
        blueprint: &ConfigurationBlueprint,
    ) -> Result<Vec<u8>, GenerateError> {
        if ca.certificate.is_empty() || ca.private_key.is_empty() {
            return Err(GenerateError::MissingCa);
        }

        let identity = kind.identity();
        let client = self.signer.sign(
            &identity,
            ca,
            blueprint.configuration().certificates_validity_days,
        )?;

        let cluster_name = blueprint.cluster_name();
        let user_name = identity.common_name;
        let context_name = format!("{}@{}", user_name, cluster_name);
        let server = blueprint.server_url();
        debug!(%kind, %server, "rendering kubeconfig");

        let mut config = KubeConfig::default();
        config.put_cluster(Cluster {
            name: cluster_name.to_owned(),
            cluster: ClusterDetail {
                certificate_authority_data: Some(STANDARD.encode(&ca.certificate)),
                server,
            },
        });
        config.put_user(User {
            name: user_name.to_owned(),
            user: UserDetail {
                client_certificate_data: Some(STANDARD.encode(&client.certificate)),
                client_key_data: Some(STANDARD.encode(&client.private_key)),
            },
        });
        config.put_context(Context {
            name: context_name.clone(),
            context: ContextDetail {
                cluster: cluster_name.to_owned(),
                user: user_name.to_owned(),
                namespace: None,
            },
        });
        config.current_context = context_name;

        Ok(config.to_bytes()?)
    }
}
