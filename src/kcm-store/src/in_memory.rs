use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use kcm_types::{Crd, K8Meta, K8Obj, ObjectMeta, Spec};

use crate::MetadataClient;
use crate::MetadataClientError;

#[derive(Debug, Error)]
pub enum InMemoryError {
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),
    #[error("lock poison error")]
    LockPoisonError,
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("conflict on {item}: resource version '{given}' is stale, current is '{current}'")]
    Conflict {
        item: String,
        given: String,
        current: String,
    },
}

type ReadPoisonError<'a> = PoisonError<RwLockReadGuard<'a, Inner>>;

impl<'a> From<ReadPoisonError<'a>> for InMemoryError {
    fn from(_error: ReadPoisonError) -> Self {
        Self::LockPoisonError
    }
}

type WritePoisonError<'a> = PoisonError<RwLockWriteGuard<'a, Inner>>;

impl<'a> From<WritePoisonError<'a>> for InMemoryError {
    fn from(_error: WritePoisonError) -> Self {
        Self::LockPoisonError
    }
}

impl MetadataClientError for InMemoryError {
    fn not_founded(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ItemKey {
    crd: &'static Crd,
    ns: String,
    name: String,
}

impl ItemKey {
    pub fn new<S>(metadata: &dyn K8Meta) -> Self
    where
        S: Spec,
    {
        ItemKey {
            crd: S::metadata(),
            ns: metadata.namespace().to_owned(),
            name: metadata.name().to_owned(),
        }
    }

    fn label(&self) -> String {
        format!("{} {}/{}", self.crd.names.kind, self.ns, self.name)
    }
}

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<ItemKey, Value>,
    version: u64,
    pending_conflicts: usize,
}

impl Inner {
    fn next_version(&mut self) -> String {
        self.version += 1;
        self.version.to_string()
    }

    /// fail write if conflict was injected or if version doesn't match
    fn check_version(&mut self, key: &ItemKey, given: &str) -> Result<(), InMemoryError> {
        let current = self
            .items
            .get(key)
            .ok_or_else(|| InMemoryError::NotFound(key.label()))?
            .pointer("/metadata/resourceVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        if self.pending_conflicts > 0 {
            self.pending_conflicts -= 1;
            return Err(InMemoryError::Conflict {
                item: key.label(),
                given: given.to_owned(),
                current,
            });
        }

        if current != given {
            return Err(InMemoryError::Conflict {
                item: key.label(),
                given: given.to_owned(),
                current,
            });
        }
        Ok(())
    }

    /// remove item and everything it owns, transitively
    fn remove_cascade(&mut self, key: &ItemKey) -> Option<Value> {
        let removed = self.items.remove(key)?;
        let mut owners: Vec<String> = uid_of(&removed).into_iter().collect();

        while let Some(owner_uid) = owners.pop() {
            let owned: Vec<ItemKey> = self
                .items
                .iter()
                .filter(|(_, value)| is_owned_by(value, &owner_uid))
                .map(|(key, _)| key.clone())
                .collect();

            for owned_key in owned {
                if let Some(value) = self.items.remove(&owned_key) {
                    debug!("garbage collecting {}", owned_key.label());
                    owners.extend(uid_of(&value));
                }
            }
        }

        Some(removed)
    }
}

fn metadata_of(value: &Value) -> Option<ObjectMeta> {
    value
        .get("metadata")
        .and_then(|metadata| serde_json::from_value(metadata.clone()).ok())
}

fn uid_of(value: &Value) -> Option<String> {
    metadata_of(value)
        .map(|metadata| metadata.uid)
        .filter(|uid| !uid.is_empty())
}

fn is_owned_by(value: &Value, uid: &str) -> bool {
    metadata_of(value)
        .map(|metadata| metadata.is_owned_by(uid))
        .unwrap_or(false)
}

/// Store kept in process memory.
///
/// Assigns uid and resource version on every write like a real API server does,
/// and deletes owned objects together with their owner.
#[derive(Debug, Default, Clone)]
pub struct InMemoryClient {
    store: Arc<RwLock<Inner>>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// make next `count` writes of existing items fail with conflict
    pub fn inject_conflicts(&self, count: usize) -> Result<(), InMemoryError> {
        let mut store = self.store.write()?;
        store.pending_conflicts = count;
        Ok(())
    }

    /// total number of stored objects
    pub fn item_count(&self) -> Result<usize, InMemoryError> {
        Ok(self.store.read()?.items.len())
    }
}

#[async_trait]
impl MetadataClient for InMemoryClient {
    type MetadataClientError = InMemoryError;

    async fn retrieve_item<S, M>(&self, metadata: &M) -> Result<K8Obj<S>, Self::MetadataClientError>
    where
        S: Spec,
        M: K8Meta + Send + Sync,
    {
        let store = self.store.read()?;
        let item_key = ItemKey::new::<S>(metadata);
        let item_value = store
            .items
            .get(&item_key)
            .ok_or_else(|| InMemoryError::NotFound(item_key.label()))?;
        Ok(serde_json::from_value(item_value.clone())?)
    }

    async fn create_item<S>(&self, value: K8Obj<S>) -> Result<K8Obj<S>, Self::MetadataClientError>
    where
        S: Spec,
    {
        let mut k8_obj = value;
        let item_key = ItemKey::new::<S>(&k8_obj.metadata);
        let mut store = self.store.write()?;
        if store.items.contains_key(&item_key) {
            return Err(InMemoryError::AlreadyExists(item_key.label()));
        }

        let version = store.next_version();
        k8_obj.api_version = S::api_version();
        k8_obj.kind = S::kind();
        k8_obj.metadata.uid = format!("uid-{}", version);
        k8_obj.metadata.resource_version = version;

        debug!("created {}", item_key.label());
        store.items.insert(item_key, serde_json::to_value(&k8_obj)?);
        Ok(k8_obj)
    }

    async fn replace_item<S>(&self, value: K8Obj<S>) -> Result<K8Obj<S>, Self::MetadataClientError>
    where
        S: Spec,
    {
        let mut k8_obj = value;
        let item_key = ItemKey::new::<S>(&k8_obj.metadata);
        let mut store = self.store.write()?;
        store.check_version(&item_key, &k8_obj.metadata.resource_version)?;

        let current: K8Obj<S> = match store.items.get(&item_key) {
            Some(current) => serde_json::from_value(current.clone())?,
            None => return Err(InMemoryError::NotFound(item_key.label())),
        };

        k8_obj.status = current.status;
        k8_obj.metadata.uid = current.metadata.uid;
        k8_obj.metadata.resource_version = store.next_version();

        debug!("replaced {}", item_key.label());
        store.items.insert(item_key, serde_json::to_value(&k8_obj)?);
        Ok(k8_obj)
    }

    async fn update_status<S>(
        &self,
        value: &K8Obj<S>,
    ) -> Result<K8Obj<S>, Self::MetadataClientError>
    where
        S: Spec,
    {
        let item_key = ItemKey::new::<S>(&value.metadata);
        let mut store = self.store.write()?;
        store.check_version(&item_key, &value.metadata.resource_version)?;

        let mut k8_obj: K8Obj<S> = match store.items.get(&item_key) {
            Some(current) => serde_json::from_value(current.clone())?,
            None => return Err(InMemoryError::NotFound(item_key.label())),
        };
        k8_obj.status = value.status.clone();
        k8_obj.metadata.resource_version = store.next_version();

        debug!("updated status of {}", item_key.label());
        store.items.insert(item_key, serde_json::to_value(&k8_obj)?);
        Ok(k8_obj)
    }

    async fn delete_item<S, M>(&self, metadata: &M) -> Result<(), Self::MetadataClientError>
    where
        S: Spec,
        M: K8Meta + Send + Sync,
    {
        let mut store = self.store.write()?;
        let item_key = ItemKey::new::<S>(metadata);
        store
            .remove_cascade(&item_key)
            .ok_or_else(|| InMemoryError::NotFound(item_key.label()))?;
        debug!("deleted {}", item_key.label());
        Ok(())
    }
}
