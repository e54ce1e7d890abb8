//! Keeps kubeconfig credentials of tenant control planes in sync with the
//! certificate authority and bootstrap configuration they are derived from.

mod ca;
mod engine;
mod error;
mod fingerprint;
mod generator;
mod kind;
mod provider;
mod reconciler;
mod status;
mod validator;

pub use ca::*;
pub use engine::*;
pub use error::ReconcileError;
pub use fingerprint::*;
pub use generator::*;
pub use kind::*;
pub use provider::*;
pub use reconciler::*;
pub use status::*;
pub use validator::*;

#[cfg(test)]
mod test_support;
