#![allow(dead_code)]

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

use kcm_config::{KubeConfig, ReconcilerSettings};
use kcm_reconcile::{
    CertificateKeyPair, ClientCertificate, ClientCertificateSigner, ClientIdentity,
    CredentialKind, CredentialReconciler, GenerateError, KubeconfigGenerator, KubeconfigValidator,
    StoredBlueprintProvider, BOOTSTRAP_CONFIG_KEY, CA_CERT_KEY, CA_KEY_KEY, CHECKSUM_ANNOTATION,
};
use kcm_store::{InMemoryClient, MetadataClient};
use kcm_types::core::secret::SecretSpec;
use kcm_types::tenant::TenantControlPlaneSpec;
use kcm_types::{ItemMeta, K8Obj};

pub const NS: &str = "tenants";

pub const BOOTSTRAP: &str = r#"clusterName: tenant-a
kubernetesVersion: v1.30.2
localAPIEndpoint:
  advertiseAddress: 10.0.0.10
  bindPort: 6443
certificatesValidityDays: 90
"#;

pub type Reconciler = CredentialReconciler<
    InMemoryClient,
    StoredBlueprintProvider<InMemoryClient>,
    KubeconfigGenerator<DigestSigner>,
    KubeconfigValidator,
>;

/// deterministic signer, certificate is digest of identity and CA
#[derive(Debug, Default)]
pub struct DigestSigner;

impl ClientCertificateSigner for DigestSigner {
    fn sign(
        &self,
        identity: &ClientIdentity,
        ca: &CertificateKeyPair,
        validity_days: u32,
    ) -> Result<ClientCertificate, GenerateError> {
        let mut certificate = Sha256::new();
        certificate.update(identity.common_name.as_bytes());
        certificate.update(&ca.certificate);
        certificate.update(&ca.private_key);
        certificate.update(validity_days.to_be_bytes());

        let mut key = Sha256::new();
        key.update(identity.common_name.as_bytes());
        key.update(&ca.private_key);

        Ok(ClientCertificate {
            certificate: hex::encode(certificate.finalize()).into_bytes(),
            private_key: hex::encode(key.finalize()).into_bytes(),
        })
    }
}

pub fn random_tenant_name() -> String {
    let rng = thread_rng();
    let suffix: String = rng
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(5)
        .collect();
    format!("tenant{}", suffix).to_lowercase()
}

pub fn new_reconciler(client: &Arc<InMemoryClient>) -> Reconciler {
    CredentialReconciler::new(
        client.clone(),
        StoredBlueprintProvider::new(client.clone()),
        KubeconfigGenerator::new(DigestSigner),
        KubeconfigValidator,
        &ReconcilerSettings::default(),
    )
}

/// store tenant with its CA and bootstrap configuration
pub async fn seed_tenant(client: &InMemoryClient, name: &str, key: &[u8]) -> ItemMeta {
    let ca_name = format!("{}-ca", name);
    let bootstrap_name = format!("{}-bootstrap", name);

    let mut tenant: K8Obj<TenantControlPlaneSpec> = K8Obj::new(
        name,
        NS,
        TenantControlPlaneSpec {
            kubernetes_version: "v1.30.2".to_owned(),
        },
    );
    tenant.status.certificates.ca.secret_name = ca_name.clone();
    tenant.status.bootstrap.secret_name = bootstrap_name.clone();
    client.create_item(tenant).await.expect("tenant created");

    let mut ca: K8Obj<SecretSpec> = K8Obj::new(ca_name.as_str(), NS, SecretSpec {});
    ca.header.put_bytes(CA_CERT_KEY, b"C1");
    ca.header.put_bytes(CA_KEY_KEY, key);
    client.create_item(ca).await.expect("ca created");

    let mut bootstrap: K8Obj<SecretSpec> = K8Obj::new(bootstrap_name.as_str(), NS, SecretSpec {});
    bootstrap
        .header
        .put_bytes(BOOTSTRAP_CONFIG_KEY, BOOTSTRAP.as_bytes());
    bootstrap
        .metadata
        .annotations
        .insert(CHECKSUM_ANNOTATION.to_owned(), "b1".to_owned());
    client.create_item(bootstrap).await.expect("bootstrap created");

    ItemMeta::new(name, NS)
}

/// replace private key of tenant's CA
pub async fn rotate_ca_key(client: &InMemoryClient, tenant: &ItemMeta, key: &[u8]) {
    let item = ItemMeta::new(format!("{}-ca", tenant.name), NS.to_owned());
    let mut ca = client
        .retrieve_item::<SecretSpec, _>(&item)
        .await
        .expect("ca");
    ca.header.put_bytes(CA_KEY_KEY, key);
    client.replace_item(ca).await.expect("ca replaced");
}

/// change bootstrap configuration checksum
pub async fn reconfigure(client: &InMemoryClient, tenant: &ItemMeta, checksum: &str) {
    let item = ItemMeta::new(format!("{}-bootstrap", tenant.name), NS.to_owned());
    let mut bootstrap = client
        .retrieve_item::<SecretSpec, _>(&item)
        .await
        .expect("bootstrap");
    bootstrap
        .metadata
        .annotations
        .insert(CHECKSUM_ANNOTATION.to_owned(), checksum.to_owned());
    client.replace_item(bootstrap).await.expect("bootstrap replaced");
}

pub async fn artifact(
    client: &InMemoryClient,
    tenant: &ItemMeta,
    kind: CredentialKind,
) -> Option<K8Obj<SecretSpec>> {
    let item = ItemMeta::new(kind.secret_name(&tenant.name), NS.to_owned());
    client.retrieve_item::<SecretSpec, _>(&item).await.ok()
}

pub fn kubeconfig_of(kind: CredentialKind, artifact: &K8Obj<SecretSpec>) -> KubeConfig {
    let payload = artifact
        .header
        .get_bytes(kind.file_name())
        .expect("payload present")
        .expect("payload is base64");
    KubeConfig::from_slice(&payload).expect("payload is kubeconfig")
}

pub fn server_of(kind: CredentialKind, artifact: &K8Obj<SecretSpec>) -> String {
    kubeconfig_of(kind, artifact)
        .current_cluster()
        .expect("current cluster")
        .cluster
        .server
        .clone()
}

pub async fn tenant_obj(client: &InMemoryClient, tenant: &ItemMeta) -> K8Obj<TenantControlPlaneSpec> {
    client
        .retrieve_item::<TenantControlPlaneSpec, _>(tenant)
        .await
        .expect("tenant")
}
