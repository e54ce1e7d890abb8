use std::fmt::Debug;
use std::fmt::Display;

use async_trait::async_trait;
use thiserror::Error;

use kcm_types::{ItemMeta, K8Obj, Spec};

use crate::MetadataClientError;

/// outcome of create or update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Unchanged,
    Created,
    Updated,
}

impl OperationResult {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

impl Display for OperationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// Brings object into desired state.
///
/// Invoked with the current object, or an empty one carrying only the item identity
/// if object doesn't exist yet. May be invoked more than once for the same write when
/// store detects conflicting writers, so every invocation must start from fresh reads
/// and only touch the object passed in.
#[async_trait]
pub trait Mutator<S>
where
    S: Spec,
{
    type Error: Debug + Display + Send;

    async fn mutate(&self, obj: &mut K8Obj<S>) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum ApplyError<C, M> {
    #[error("store error: {0}")]
    Client(C),
    #[error("{0}")]
    Mutate(M),
    #[error("mutation changed identity of {expected} to {actual}")]
    IdentityChanged { expected: ItemMeta, actual: ItemMeta },
}

impl<C, M> ApplyError<C, M>
where
    C: MetadataClientError,
{
    /// true if write lost race against another writer
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Client(err) => err.is_conflict() || err.is_already_exists(),
            _ => false,
        }
    }
}
