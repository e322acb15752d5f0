//! The peer transport boundary: how Swarm and Oracle actually reach a
//! remote peer's `network_locator`. The concrete wire protocol is out of
//! scope (spec.md §1 lists "the concrete SMPC transport" as an external
//! collaborator; the peer RPC transport is the same kind of boundary for
//! the gossip substrate), so this crate only defines the request/response
//! shapes and the trait Swarm/Oracle drive against, the same way
//! `SmpcAdapter` is injected rather than hard-wired to a concrete network
//! stack.

use async_trait::async_trait;
use darkpool_types::MultiAddress;

/// Errors a [`PeerTransport`] surfaces. Transport failures are logged and
/// do not abort a fan-out (spec.md §4.H "Failure semantics"); callers
/// decide whether a given failure is fatal to the operation as a whole.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The RPC did not complete before its deadline.
    #[error("RPC to {0} timed out")]
    Timeout(String),
    /// The caller's cancellation handle fired mid-flight.
    #[error("RPC to {0} cancelled")]
    Cancelled(String),
    /// Any other connection-level failure.
    #[error("RPC to {0} failed: {1}")]
    Connection(String, String),
}

/// One peer's answer to a `Query` RPC: `target`'s own `MultiAddress` as a
/// single-element vector if the peer has it stored, else up to α addresses
/// the asker can continue the iterative search with (spec.md §4.H: "Query
/// returns [stored] if known, else α random").
pub type QueryAnswer = Vec<MultiAddress>;

/// Boundary to the concrete peer-to-peer wire protocol. One call per RPC
/// kind, addressed by the peer's `network_locator` (spec.md §4.H).
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Sends our current `MultiAddress` to `peer` as a `Ping`. The remote
    /// answers with its own current `MultiAddress` (the `Pong`).
    async fn ping(&self, peer: &str, from: &MultiAddress) -> Result<MultiAddress, TransportError>;

    /// Re-gossips `m` to `peer` with no response expected beyond
    /// acknowledgement of receipt.
    async fn broadcast(&self, peer: &str, m: &MultiAddress) -> Result<(), TransportError>;

    /// Asks `peer` what it knows about `target`'s `MultiAddress`.
    async fn query(&self, peer: &str, target: alloy::primitives::Address) -> Result<QueryAnswer, TransportError>;

    /// Ships a signed oracle `MidpointPrice` update to `peer`.
    async fn send_midpoint_price(
        &self,
        peer: &str,
        price: &darkpool_types::MidpointPrice,
    ) -> Result<(), TransportError>;
}
