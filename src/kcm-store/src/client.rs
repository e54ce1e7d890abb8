use std::fmt::Debug;
use std::fmt::Display;

use async_trait::async_trait;
use serde_json::Error as SerdeJsonError;
use tracing::debug;
use tracing::trace;

use kcm_types::{ItemMeta, K8Meta, K8Obj, Spec};

use crate::{ApplyError, Mutator, OperationResult};

/// classification of store errors
pub trait MetadataClientError: Debug + Display {
    /// item doesn't exist
    fn not_founded(&self) -> bool;

    /// write was based on stale resource version
    fn is_conflict(&self) -> bool;

    /// create raced with another create of same item
    fn is_already_exists(&self) -> bool;
}

/// Object store with optimistic concurrency.
///
/// Every write carries the resource version it was based on; writes based on
/// an outdated version fail with a conflict.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    type MetadataClientError: MetadataClientError + Send + Sync + From<SerdeJsonError>;

    /// retrieval a single item
    async fn retrieve_item<S, M>(
        &self,
        metadata: &M,
    ) -> Result<K8Obj<S>, Self::MetadataClientError>
    where
        S: Spec,
        M: K8Meta + Send + Sync;

    /// create new object, fails if it already exists
    async fn create_item<S>(&self, value: K8Obj<S>) -> Result<K8Obj<S>, Self::MetadataClientError>
    where
        S: Spec;

    /// replace metadata, spec and payload of existing object.
    /// status is not changed
    async fn replace_item<S>(&self, value: K8Obj<S>) -> Result<K8Obj<S>, Self::MetadataClientError>
    where
        S: Spec;

    /// update status only
    async fn update_status<S>(
        &self,
        value: &K8Obj<S>,
    ) -> Result<K8Obj<S>, Self::MetadataClientError>
    where
        S: Spec;

    /// delete object together with objects it owns
    async fn delete_item<S, M>(&self, metadata: &M) -> Result<(), Self::MetadataClientError>
    where
        S: Spec,
        M: K8Meta + Send + Sync;

    /// Check if the object exists, return true or false.
    async fn exists<S, M>(&self, metadata: &M) -> Result<bool, Self::MetadataClientError>
    where
        S: Spec,
        M: K8Meta + Display + Send + Sync,
    {
        debug!("check if '{}' exists", metadata);
        match self.retrieve_item::<S, M>(metadata).await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.not_founded() {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Read object, let mutator bring it into desired state and write it back.
    /// If object doesn't exist, it will be created.
    /// If mutation doesn't change the object, nothing is written.
    ///
    /// This is single attempt; use `create_or_update_with_conflict` to retry on conflicts.
    async fn create_or_update<S, Mu>(
        &self,
        item: &ItemMeta,
        mutator: &Mu,
    ) -> Result<(OperationResult, K8Obj<S>), ApplyError<Self::MetadataClientError, Mu::Error>>
    where
        S: Spec,
        Mu: Mutator<S> + Sync,
    {
        let (mut obj, found) = match self.retrieve_item::<S, _>(item).await {
            Ok(obj) => (obj, true),
            Err(err) if err.not_founded() => (K8Obj::for_item(item), false),
            Err(err) => return Err(ApplyError::Client(err)),
        };

        let before = serde_json::to_value(&obj).map_err(|err| ApplyError::Client(err.into()))?;

        mutator.mutate(&mut obj).await.map_err(ApplyError::Mutate)?;

        if obj.metadata.name != item.name || obj.metadata.namespace != item.namespace {
            return Err(ApplyError::IdentityChanged {
                expected: item.clone(),
                actual: obj.item(),
            });
        }

        if !found {
            debug!("{}: item '{}' not found, creating ...", S::label(), item);
            let created = self.create_item(obj).await.map_err(ApplyError::Client)?;
            return Ok((OperationResult::Created, created));
        }

        let after = serde_json::to_value(&obj).map_err(|err| ApplyError::Client(err.into()))?;
        if before == after {
            debug!("{}: no change detected for '{}', doing nothing", S::label(), item);
            return Ok((OperationResult::Unchanged, obj));
        }

        trace!("{}: old: {:#?}", S::label(), before);
        trace!("{}: new: {:#?}", S::label(), after);
        debug!("{}: updating '{}'", S::label(), item);
        let updated = self.replace_item(obj).await.map_err(ApplyError::Client)?;
        Ok((OperationResult::Updated, updated))
    }
}
