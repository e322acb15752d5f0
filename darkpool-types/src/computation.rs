//! [`Computation`]: one buy x sell pair being resolved by the matcher.

use alloy::primitives::{B256, Keccak256};
use serde::{Deserialize, Serialize};

use crate::order::{OrderFragment, OrderId};
use crate::share::CoExpShares;

/// Identifier of a computation, derived from its two fragment IDs.
pub type ComputationId = B256;

/// Opaque epoch hash the computation was created under.
pub type Epoch = B256;

/// Terminal (and Nil) states of a [`Computation`].
///
/// `Nil` is the only non-terminal state. Transitions out of `Nil` are
/// monotone and final: a committed non-`Nil` state is never overwritten
/// (spec.md §3, invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputationState {
    /// Not yet resolved.
    Nil,
    /// The two fragments matched.
    Matched,
    /// The two fragments were compared and did not match.
    Mismatched,
    /// The computation was abandoned because an order expired, or admission
    /// failed in a way the pipeline could not even start (silently, no
    /// callback).
    Rejected,
}

impl ComputationState {
    /// Whether this is a terminal state (anything but `Nil`).
    pub fn is_terminal(self) -> bool {
        !matches!(self, ComputationState::Nil)
    }
}

/// A buy/sell pair under resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Computation {
    /// Derived from `(buy.order_id, sell.order_id)`, see [`Computation::derive_id`].
    pub id: ComputationId,
    /// Epoch this computation was created under.
    pub epoch: Epoch,
    /// The buy-side fragment.
    pub buy: OrderFragment,
    /// The sell-side fragment.
    pub sell: OrderFragment,
    /// The oracle midpoint price, as shares, once populated by the matcher
    /// for a midpoint stage. `None` until then.
    pub midpoint_price: Option<CoExpShares>,
    /// Current resolution state.
    pub state: ComputationState,
    /// Whether the two fragments matched. Only meaningful once `state` is
    /// terminal; `false` for `Mismatched` and `Rejected`.
    pub matched: bool,
}

impl Computation {
    /// Creates a new, unresolved computation. `id` is derived from the two
    /// fragment IDs and is immutable thereafter.
    pub fn new(epoch: Epoch, buy: OrderFragment, sell: OrderFragment) -> Self {
        let id = Self::derive_id(&buy.order_id, &sell.order_id);
        Self {
            id,
            epoch,
            buy,
            sell,
            midpoint_price: None,
            state: ComputationState::Nil,
            matched: false,
        }
    }

    /// Derives a computation ID from its two fragment IDs.
    ///
    /// `keccak256(buy_id || sell_id)`. Buy and sell play asymmetric roles
    /// in the pipeline, so their order in the hash is fixed rather than
    /// sorted.
    pub fn derive_id(buy_id: &OrderId, sell_id: &OrderId) -> ComputationId {
        let mut hasher = Keccak256::new();
        hasher.update(buy_id);
        hasher.update(sell_id);
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic_and_role_sensitive() {
        let a = B256::repeat_byte(0xaa);
        let b = B256::repeat_byte(0xbb);
        assert_eq!(Computation::derive_id(&a, &b), Computation::derive_id(&a, &b));
        assert_ne!(Computation::derive_id(&a, &b), Computation::derive_id(&b, &a));
    }
}
