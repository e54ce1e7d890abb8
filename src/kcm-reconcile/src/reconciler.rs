use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::{debug, error, info, instrument};

use kcm_config::{ConfigurationBlueprint, ReconcilerSettings};
use kcm_store::{
    cancellable, create_or_update_with_conflict, CancellationToken, MetadataClient,
    MetadataClientError, Mutator, OperationResult, RetryPolicy, SharedClient,
};
use kcm_types::core::secret::SecretSpec;
use kcm_types::tenant::TenantControlPlaneSpec;
use kcm_types::{ItemMeta, K8Obj};

use crate::{
    read_ca, ConfigurationProvider, CredentialGenerator, CredentialKind, CredentialValidator,
    ArtifactDecision, ReconcileError, ReconciliationEngine, StatusSynchronizer,
    CHECKSUM_ANNOTATION,
};

/// result of one reconciliation pass for a single credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub kind: CredentialKind,
    pub result: OperationResult,
    pub secret_name: String,
    pub checksum: String,
    /// credential was generated in this pass, even if the store already held identical bytes
    pub regenerated: bool,
}

/// Runs engine against the stored artifact.
/// CA is read again on every invocation since conflicting writes repeat the mutation.
struct KubeconfigMutator<'a, C, G, V> {
    client: &'a C,
    token: &'a CancellationToken,
    engine: &'a ReconciliationEngine<G, V>,
    tenant: &'a K8Obj<TenantControlPlaneSpec>,
    blueprint: &'a ConfigurationBlueprint,
    kind: CredentialKind,
    decision: Mutex<Option<ArtifactDecision>>,
}

#[async_trait]
impl<'a, C, G, V> Mutator<SecretSpec> for KubeconfigMutator<'a, C, G, V>
where
    C: MetadataClient,
    G: CredentialGenerator,
    V: CredentialValidator,
{
    type Error = ReconcileError;

    async fn mutate(&self, obj: &mut K8Obj<SecretSpec>) -> Result<(), Self::Error> {
        let ca = read_ca(self.client, self.token, self.tenant).await?;
        let status = self.kind.status(&self.tenant.status.kubeconfig);
        let decision = self.engine.reconcile_artifact(
            self.tenant,
            self.kind,
            self.blueprint,
            &ca,
            obj,
            status,
        )?;
        debug!(?decision, "artifact reconciled");
        *self.decision.lock().unwrap_or_else(PoisonError::into_inner) = Some(decision);
        Ok(())
    }
}

/// Keeps kubeconfig credentials of tenants in sync with their CA and bootstrap configuration.
pub struct CredentialReconciler<C, P, G, V> {
    client: SharedClient<C>,
    provider: P,
    engine: ReconciliationEngine<G, V>,
    policy: RetryPolicy,
    status: StatusSynchronizer<C>,
}

impl<C, P, G, V> CredentialReconciler<C, P, G, V>
where
    C: MetadataClient,
    P: ConfigurationProvider,
    G: CredentialGenerator,
    V: CredentialValidator,
{
    pub fn new(
        client: SharedClient<C>,
        provider: P,
        generator: G,
        validator: V,
        settings: &ReconcilerSettings,
    ) -> Self {
        let policy = RetryPolicy {
            attempts: settings.conflict_retry.attempts,
            backoff: settings.conflict_retry.backoff(),
        };
        Self {
            status: StatusSynchronizer::new(client.clone(), policy.clone()),
            engine: ReconciliationEngine::new(generator, validator, settings),
            client,
            provider,
            policy,
        }
    }

    async fn fetch_tenant(
        &self,
        token: &CancellationToken,
        tenant: &ItemMeta,
    ) -> Result<K8Obj<TenantControlPlaneSpec>, ReconcileError> {
        cancellable(
            token,
            self.client
                .retrieve_item::<TenantControlPlaneSpec, _>(tenant),
        )
        .await
        .ok_or(ReconcileError::Cancelled)?
        .map_err(|err| {
            if err.not_founded() {
                ReconcileError::DependencyUnavailable(format!("tenant {} not found", tenant))
            } else {
                ReconcileError::unavailable(format!("cannot retrieve tenant {}", tenant), err)
            }
        })
    }

    /// Reconcile single credential of tenant.
    ///
    /// Artifact is written only if it is missing, unusable or derived from outdated
    /// CA or bootstrap configuration. Status slot of `kind` is updated whenever credential
    /// was regenerated, so a slot left behind by a failed status write is repaired on the next pass.
    #[instrument(skip_all, fields(tenant = %tenant, kind = %kind))]
    pub async fn reconcile(
        &self,
        token: &CancellationToken,
        tenant: &ItemMeta,
        kind: CredentialKind,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let tenant_obj = self.fetch_tenant(token, tenant).await?;
        let blueprint = cancellable(token, self.provider.blueprint(&tenant_obj))
            .await
            .ok_or(ReconcileError::Cancelled)??;

        let item = ItemMeta::new(kind.secret_name(&tenant.name), tenant.namespace.clone());
        let mutator = KubeconfigMutator {
            client: self.client.as_ref(),
            token,
            engine: &self.engine,
            tenant: &tenant_obj,
            blueprint: &blueprint,
            kind,
            decision: Mutex::new(None),
        };

        let (result, artifact) = create_or_update_with_conflict::<C, SecretSpec, _>(
            self.client.as_ref(),
            token,
            &self.policy,
            &item,
            &mutator,
        )
        .await
        .map_err(ReconcileError::from_write)?;

        let decision = mutator
            .decision
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let regenerated = matches!(decision, Some(ArtifactDecision::Staged { .. }));
        let checksum = match (decision, artifact.metadata.annotations.get(CHECKSUM_ANNOTATION)) {
            (Some(decision), _) => decision.checksum().to_owned(),
            (None, Some(checksum)) => checksum.clone(),
            (None, None) => kind.status(&tenant_obj.status.kubeconfig).checksum.clone(),
        };
        let outcome = ReconcileOutcome {
            kind,
            result,
            secret_name: item.name,
            checksum,
            regenerated,
        };

        self.status.sync(token, tenant, &outcome).await?;
        info!(result = %outcome.result, secret = %outcome.secret_name, "kubeconfig reconciled");
        Ok(outcome)
    }

    /// Reconcile every credential kind of tenant.
    /// Kinds are independent, failure of one doesn't stop the others.
    pub async fn reconcile_all(
        &self,
        token: &CancellationToken,
        tenant: &ItemMeta,
    ) -> Vec<(CredentialKind, Result<ReconcileOutcome, ReconcileError>)> {
        let mut results = Vec::with_capacity(CredentialKind::ALL.len());
        for kind in CredentialKind::ALL {
            let result = self.reconcile(token, tenant, kind).await;
            if let Err(err) = &result {
                error!(%tenant, %kind, retryable = err.is_retryable(), "{}", err);
            }
            results.push((kind, result));
        }
        results
    }
}
