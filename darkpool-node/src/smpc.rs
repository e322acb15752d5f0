//! The SMPC adapter boundary (spec.md §4.E): an external collaborator
//! that submits a share "join" and delivers its revealed value
//! asynchronously. The concrete transport (the actual multi-party
//! protocol that carries shares between nodes) is out of scope; this
//! module only defines the contract the Matcher drives against, an
//! injected boundary trait a caller supplies its own implementation for.
//!
//! Spec.md phrases the contract as `Join(networkID, join, callback)`; here
//! the callback is represented as the resolution of the returned future
//! rather than a boxed closure, which is the idiomatic async-Rust
//! rendering of "fires at-most-once with the revealed values" and keeps
//! the Matcher a straight-line `async fn` instead of a callback-threading
//! state machine. A join the adapter's internal timeout drops without a
//! callback resolves to `Ok(vec![])`, which the pipeline already treats
//! as [`darkpool_core::Decision::Dropped`] via `values.len() == 0`.

use async_trait::async_trait;
use darkpool_types::Join;

/// Errors an [`SmpcAdapter`] surfaces from `join` itself. Per spec.md
/// §4.E, failures are always a return-value error from submission, never
/// smuggled into the revealed values.
#[derive(Debug, thiserror::Error)]
pub enum SmpcError {
    /// The transport could not accept or complete the join (e.g. network
    /// failure reaching the SMPC cluster).
    #[error("transport failure submitting join: {0}")]
    Transport(String),
    /// The network id the join targeted is unknown to this adapter.
    #[error("unknown SMPC network id: {0}")]
    UnknownNetwork(u64),
}

/// Boundary to the SMPC transport. Implementations submit `join` against
/// `network_id` and resolve with whatever scalars the multi-party
/// protocol revealed. The adapter owns per-join timeouts: a join that
/// times out without the protocol completing resolves as `Ok(vec![])`
/// rather than an error (spec.md §4.E: "no callback arrival ≡ join
/// effectively dropped").
#[async_trait]
pub trait SmpcAdapter: Send + Sync {
    /// Submits `join` against `network_id` and awaits its revealed
    /// value(s).
    async fn join(&self, network_id: u64, join: Join) -> Result<Vec<u64>, SmpcError>;
}
