use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use fluvio_future::timer::sleep;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use kcm_types::{ItemMeta, K8Obj, Spec};

use crate::cancellable;
use crate::{ApplyError, MetadataClient, Mutator, OperationResult};

const DEFAULT_ATTEMPTS: usize = 5;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(10);

/// how often and how fast conflicting writes are retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("{0}")]
    Failed(E),
    #[error("still conflicting after {attempts} attempts: {last}")]
    Exhausted { attempts: usize, last: E },
    #[error("operation cancelled")]
    Cancelled,
}

/// Run operation until it succeeds, fails with non conflict error or attempts run out.
/// Each attempt must re-read whatever it writes.
pub async fn retry_on_conflict<T, E, F, Fut, P>(
    token: &CancellationToken,
    policy: &RetryPolicy,
    is_conflict: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        if token.is_cancelled() {
            return Err(RetryError::Cancelled);
        }
        attempt += 1;
        let result = match cancellable(token, operation()).await {
            Some(result) => result,
            None => return Err(RetryError::Cancelled),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) if is_conflict(&err) => {
                if attempt >= attempts {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }
                debug!(attempt, "conflicting write, retrying: {}", err);
                if cancellable(token, sleep(policy.backoff)).await.is_none() {
                    return Err(RetryError::Cancelled);
                }
            }
            Err(err) => return Err(RetryError::Failed(err)),
        }
    }
}

/// `create_or_update` which is repeated from a fresh read whenever write conflicts
pub async fn create_or_update_with_conflict<C, S, Mu>(
    client: &C,
    token: &CancellationToken,
    policy: &RetryPolicy,
    item: &ItemMeta,
    mutator: &Mu,
) -> Result<(OperationResult, K8Obj<S>), RetryError<ApplyError<C::MetadataClientError, Mu::Error>>>
where
    C: MetadataClient,
    S: Spec,
    Mu: Mutator<S> + Sync,
{
    retry_on_conflict(
        token,
        policy,
        |err: &ApplyError<C::MetadataClientError, Mu::Error>| err.is_conflict(),
        move || client.create_or_update::<S, Mu>(item, mutator),
    )
    .await
}
