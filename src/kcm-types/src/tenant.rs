//!
//! # Tenant control plane
//!
//! Owning record of every generated credential. Status carries one slot
//! per managed kubeconfig.
//!
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::Crd;
use crate::CrdNames;
use crate::DefaultHeader;
use crate::Spec;
use crate::Status;
use crate::GROUP;
use crate::V1ALPHA1;

const TENANT_CONTROL_PLANE_API: Crd = Crd {
    group: GROUP,
    version: V1ALPHA1,
    names: CrdNames {
        kind: "TenantControlPlane",
        plural: "tenantcontrolplanes",
        singular: "tenantcontrolplane",
    },
};

impl Spec for TenantControlPlaneSpec {
    type Status = TenantControlPlaneStatus;
    type Header = DefaultHeader;

    fn metadata() -> &'static Crd {
        &TENANT_CONTROL_PLANE_API
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantControlPlaneSpec {
    pub kubernetes_version: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantControlPlaneStatus {
    pub certificates: CertificatesStatus,
    pub bootstrap: SecretReferenceStatus,
    pub kubeconfig: KubeconfigsStatus,
}

impl Status for TenantControlPlaneStatus {}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificatesStatus {
    pub ca: SecretReferenceStatus,
}

/// location of secret produced outside of credential reconciliation
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretReferenceStatus {
    pub secret_name: String,
    pub checksum: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeconfigsStatus {
    pub admin: KubeconfigStatus,
    pub controller_manager: KubeconfigStatus,
    pub scheduler: KubeconfigStatus,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeconfigStatus {
    pub secret_name: String,
    pub checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}
