mod apply;
mod cancel;
mod client;
mod in_memory;
mod retry;

pub use apply::ApplyError;
pub use apply::Mutator;
pub use apply::OperationResult;
pub use cancel::cancellable;
pub use client::MetadataClient;
pub use client::MetadataClientError;
pub use in_memory::InMemoryClient;
pub use in_memory::InMemoryError;
pub use retry::create_or_update_with_conflict;
pub use retry::retry_on_conflict;
pub use retry::RetryError;
pub use retry::RetryPolicy;

pub use tokio_util::sync::CancellationToken;

pub type SharedClient<C> = std::sync::Arc<C>;
