use std::fmt;

use kcm_config::ConfigurationBlueprint;
use kcm_types::tenant::{KubeconfigStatus, KubeconfigsStatus};

use crate::ReconcileError;

pub const ADMIN_KUBECONFIG_FILE_NAME: &str = "admin.conf";
pub const CONTROLLER_MANAGER_KUBECONFIG_FILE_NAME: &str = "controller-manager.conf";
pub const SCHEDULER_KUBECONFIG_FILE_NAME: &str = "scheduler.conf";

/// identity client certificate is issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIdentity {
    pub common_name: &'static str,
    pub organizations: &'static [&'static str],
}

/// Role a generated kubeconfig serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    Admin,
    ControllerManager,
    Scheduler,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 3] = [Self::Admin, Self::ControllerManager, Self::Scheduler];

    /// key of kubeconfig inside secret payload
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Admin => ADMIN_KUBECONFIG_FILE_NAME,
            Self::ControllerManager => CONTROLLER_MANAGER_KUBECONFIG_FILE_NAME,
            Self::Scheduler => SCHEDULER_KUBECONFIG_FILE_NAME,
        }
    }

    pub fn from_file_name(file_name: &str) -> Result<Self, ReconcileError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.file_name() == file_name)
            .ok_or_else(|| {
                ReconcileError::Configuration(format!(
                    "kubeconfig file name '{}' is not a known credential",
                    file_name
                ))
            })
    }

    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Admin => "admin-kubeconfig",
            Self::ControllerManager => "controller-manager-kubeconfig",
            Self::Scheduler => "scheduler-kubeconfig",
        }
    }

    /// name of secret holding this credential for tenant
    pub fn secret_name(&self, tenant: &str) -> String {
        format!("{}-{}", tenant, self.resource_name())
    }

    pub fn identity(&self) -> ClientIdentity {
        match self {
            Self::Admin => ClientIdentity {
                common_name: "kubernetes-admin",
                organizations: &["system:masters"],
            },
            Self::ControllerManager => ClientIdentity {
                common_name: "system:kube-controller-manager",
                organizations: &[],
            },
            Self::Scheduler => ClientIdentity {
                common_name: "system:kube-scheduler",
                organizations: &[],
            },
        }
    }

    /// components using this credential run next to API server
    pub fn is_co_located(&self) -> bool {
        matches!(self, Self::ControllerManager | Self::Scheduler)
    }

    /// Blueprint credential is generated from.
    /// Co-located components always reach API server over loopback.
    pub fn customize(
        &self,
        blueprint: &ConfigurationBlueprint,
        loopback_address: &str,
    ) -> ConfigurationBlueprint {
        if self.is_co_located() {
            blueprint.with_advertise_address(loopback_address)
        } else {
            blueprint.clone()
        }
    }

    pub fn status<'a>(&self, status: &'a KubeconfigsStatus) -> &'a KubeconfigStatus {
        match self {
            Self::Admin => &status.admin,
            Self::ControllerManager => &status.controller_manager,
            Self::Scheduler => &status.scheduler,
        }
    }

    pub fn status_mut<'a>(&self, status: &'a mut KubeconfigsStatus) -> &'a mut KubeconfigStatus {
        match self {
            Self::Admin => &mut status.admin,
            Self::ControllerManager => &mut status.controller_manager,
            Self::Scheduler => &mut status.scheduler,
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.resource_name())
    }
}
