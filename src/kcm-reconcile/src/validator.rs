use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use kcm_config::KubeConfig;

/// checks that existing credential payload is still usable
pub trait CredentialValidator: Send + Sync {
    fn is_valid(&self, payload: &[u8]) -> bool;
}

/// Accepts kubeconfig whose current context resolves to a cluster with server
/// and CA data, and to a user with client certificate and key data.
#[derive(Debug, Default, Clone, Copy)]
pub struct KubeconfigValidator;

fn has_data(value: &Option<String>) -> bool {
    value
        .as_deref()
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .map(|decoded| !decoded.is_empty())
        .unwrap_or(false)
}

impl CredentialValidator for KubeconfigValidator {
    fn is_valid(&self, payload: &[u8]) -> bool {
        let config = match KubeConfig::from_slice(payload) {
            Ok(config) => config,
            Err(err) => {
                debug!("kubeconfig is not parseable: {}", err);
                return false;
            }
        };

        let cluster = match config.current_cluster() {
            Some(cluster) => &cluster.cluster,
            None => return false,
        };
        let user = match config.current_user() {
            Some(user) => &user.user,
            None => return false,
        };

        !cluster.server.is_empty()
            && has_data(&cluster.certificate_authority_data)
            && has_data(&user.client_certificate_data)
            && has_data(&user.client_key_data)
    }
}
