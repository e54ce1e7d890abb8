use chrono::Utc;
use tracing::debug;

use kcm_store::{
    retry_on_conflict, CancellationToken, MetadataClient, MetadataClientError, RetryError,
    RetryPolicy, SharedClient,
};
use kcm_types::tenant::TenantControlPlaneSpec;
use kcm_types::{ItemMeta, K8Obj};

use crate::{ReconcileError, ReconcileOutcome};

/// Records outcome of credential reconciliation in tenant status.
pub struct StatusSynchronizer<C> {
    client: SharedClient<C>,
    policy: RetryPolicy,
}

impl<C> StatusSynchronizer<C>
where
    C: MetadataClient,
{
    pub fn new(client: SharedClient<C>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    async fn write_slot(
        &self,
        tenant: &ItemMeta,
        outcome: &ReconcileOutcome,
    ) -> Result<K8Obj<TenantControlPlaneSpec>, C::MetadataClientError> {
        let mut current = self
            .client
            .retrieve_item::<TenantControlPlaneSpec, _>(tenant)
            .await?;

        let slot = outcome.kind.status_mut(&mut current.status.kubeconfig);
        slot.secret_name = outcome.secret_name.clone();
        slot.checksum = outcome.checksum.clone();
        slot.last_update = Some(Utc::now());

        self.client.update_status(&current).await
    }

    /// Write status slot of outcome's kind.
    /// Nothing is read or written when credential was neither written nor regenerated.
    /// Returns whether status was written.
    pub async fn sync(
        &self,
        token: &CancellationToken,
        tenant: &ItemMeta,
        outcome: &ReconcileOutcome,
    ) -> Result<bool, ReconcileError> {
        if outcome.result.is_unchanged() && !outcome.regenerated {
            return Ok(false);
        }

        retry_on_conflict(
            token,
            &self.policy,
            |err: &C::MetadataClientError| err.is_conflict(),
            || self.write_slot(tenant, outcome),
        )
        .await
        .map_err(|err| match err {
            RetryError::Cancelled => ReconcileError::Cancelled,
            RetryError::Exhausted { attempts, last } => ReconcileError::DependencyUnavailable(
                format!("status of {} still conflicting after {} attempts: {}", tenant, attempts, last),
            ),
            RetryError::Failed(err) => {
                ReconcileError::unavailable(format!("cannot update status of {}", tenant), err)
            }
        })?;

        debug!(%tenant, kind = %outcome.kind, checksum = %outcome.checksum, "status updated");
        Ok(true)
    }
}
