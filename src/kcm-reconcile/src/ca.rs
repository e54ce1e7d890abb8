use std::fmt;

use tracing::debug;

use kcm_store::{cancellable, CancellationToken, MetadataClient};
use kcm_types::core::secret::SecretSpec;
use kcm_types::tenant::TenantControlPlaneSpec;
use kcm_types::{ItemMeta, K8Obj};

use crate::ReconcileError;

pub const CA_CERT_KEY: &str = "ca.crt";
pub const CA_KEY_KEY: &str = "ca.key";

/// certificate authority the credentials are signed with.
/// only read, never written back
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateKeyPair {
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl fmt::Debug for CertificateKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CertificateKeyPair")
            .field("certificate", &format!("{} bytes", self.certificate.len()))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl CertificateKeyPair {
    pub fn new(certificate: Vec<u8>, private_key: Vec<u8>) -> Self {
        Self {
            certificate,
            private_key,
        }
    }

    pub fn from_secret(secret: &K8Obj<SecretSpec>) -> Result<Self, ReconcileError> {
        let read = |key: &str| -> Result<Vec<u8>, ReconcileError> {
            match secret.header.get_bytes(key) {
                Some(Ok(bytes)) if !bytes.is_empty() => Ok(bytes),
                Some(Ok(_)) => Err(ReconcileError::DependencyUnavailable(format!(
                    "'{}' of CA secret {} is empty",
                    key,
                    secret.item()
                ))),
                Some(Err(err)) => Err(ReconcileError::unavailable(
                    format!("'{}' of CA secret {} is not readable", key, secret.item()),
                    err,
                )),
                None => Err(ReconcileError::DependencyUnavailable(format!(
                    "CA secret {} has no '{}'",
                    secret.item(),
                    key
                ))),
            }
        };

        Ok(Self::new(read(CA_CERT_KEY)?, read(CA_KEY_KEY)?))
    }
}

/// Read CA of tenant from its secret.
/// Always goes to the store, nothing is cached between calls.
pub async fn read_ca<C>(
    client: &C,
    token: &CancellationToken,
    tenant: &K8Obj<TenantControlPlaneSpec>,
) -> Result<CertificateKeyPair, ReconcileError>
where
    C: MetadataClient,
{
    let secret_name = &tenant.status.certificates.ca.secret_name;
    if secret_name.is_empty() {
        return Err(ReconcileError::DependencyUnavailable(format!(
            "CA of tenant {} is not provisioned yet",
            tenant.item()
        )));
    }

    let item = ItemMeta::new(secret_name.as_str(), tenant.metadata.namespace.as_str());
    debug!(%item, "reading CA");
    let secret = cancellable(token, client.retrieve_item::<SecretSpec, _>(&item))
        .await
        .ok_or(ReconcileError::Cancelled)?
        .map_err(|err| ReconcileError::unavailable(format!("cannot retrieve CA {}", item), err))?;

    CertificateKeyPair::from_secret(&secret)
}
