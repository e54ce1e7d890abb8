use std::future::Future;

use futures::future::FutureExt;
use futures::pin_mut;
use futures::select_biased;
use tokio_util::sync::CancellationToken;

/// run future until it completes or token is cancelled.
/// returns none if cancelled, cancellation wins when both are ready
pub async fn cancellable<F>(token: &CancellationToken, future: F) -> Option<F::Output>
where
    F: Future,
{
    if token.is_cancelled() {
        return None;
    }

    let cancelled = token.cancelled().fuse();
    let work = future.fuse();
    pin_mut!(cancelled, work);

    select_biased! {
        _ = cancelled => None,
        output = work => Some(output),
    }
}
