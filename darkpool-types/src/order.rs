//! [`OrderFragment`] and the small enums that classify it.

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

use crate::share::{CoExpShares, Share};

/// Identifier of a single order fragment, as handed to the node by the
/// (out of scope) order-ingest surface.
pub type OrderId = B256;

/// Which side of a computation an order fragment represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    /// A buy order.
    Buy,
    /// A sell order.
    Sell,
}

/// The pricing behaviour of an order fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// A plain limit order: the fragment's own price is used.
    Limit,
    /// The fragment's effective price is the oracle midpoint at match time.
    Midpoint,
    /// Like [`OrderType::Midpoint`], but intended to be filled entirely or
    /// not at all (fill-or-kill). The matcher does not distinguish this
    /// from [`OrderType::Midpoint`] for pricing purposes; the FOK semantics
    /// belong to the (out of scope) order-ingest / settlement layer.
    MidpointFOK,
}

impl OrderType {
    /// Whether this order type resolves its price from the oracle midpoint.
    pub fn is_midpoint(self) -> bool {
        matches!(self, OrderType::Midpoint | OrderType::MidpointFOK)
    }
}

/// Opaque settlement-layer identifier. Two fragments may only match if their
/// settlement fields are equal (spec.md §4.F, Admission).
pub type OrderSettlement = B256;

/// One side (buy or sell) of a computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFragment {
    /// Identifier of this fragment.
    pub order_id: OrderId,
    /// Buy or sell.
    pub parity: Parity,
    /// Limit, midpoint, or midpoint-FOK.
    pub order_type: OrderType,
    /// Settlement-layer identifier; must match the counterparty's.
    pub order_settlement: OrderSettlement,
    /// Share of the traded token pair identifier, compared against the
    /// counterparty's at the `Tokens` stage to confirm both sides agree on
    /// the same pair without revealing it.
    pub tokens: Share,
    /// The cleartext token-pair identifier this fragment trades, used to
    /// key the oracle midpoint lookup (`MidpointPriceStore::get`). Public
    /// market routing metadata, distinct from the private `tokens` share
    /// cross-check above.
    pub token_pair: u64,
    /// Limit price, as encrypted shares. Mutated in place by the matcher
    /// when a midpoint stage decides to substitute the oracle midpoint.
    pub price: CoExpShares,
    /// Requested volume, as encrypted shares.
    pub volume: CoExpShares,
    /// Minimum acceptable volume, as encrypted shares.
    pub minimum_volume: CoExpShares,
    /// Unix timestamp after which this fragment is no longer eligible to
    /// match (spec.md §4.F: "now > OrderExpiry" is the expiry condition,
    /// using a strict inequality).
    pub order_expiry: u64,
}

impl OrderFragment {
    /// Whether `now` is past this fragment's expiry. Expiry uses a strict
    /// `>` comparison: `order_expiry == now` is *not* expired (spec.md §8).
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.order_expiry
    }
}
