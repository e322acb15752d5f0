//! [`MidpointPriceStore`]: a nonce-versioned per-token-pair price map
//! (spec.md §4.B). Single-writer discipline is enforced by the store's own
//! lock; nonce monotonicity is the caller's responsibility (the oracle
//! server compares against `nonce()` before calling `put`).

use std::collections::HashMap;
use std::sync::Arc;

use darkpool_types::MidpointPrice;
use parking_lot::RwLock;

use crate::metrics::METRICS_ID_MIDPOINT_STORE_SIZE;

/// Errors returned by [`MidpointPriceStore`].
#[derive(Debug, thiserror::Error)]
pub enum MidpointPriceStoreError {
    /// No price is known for the requested token pair.
    #[error("no midpoint price known for token pair {0}")]
    NotFound(u64),
}

#[derive(Default)]
struct Inner {
    prices: HashMap<u64, u64>,
    nonce: u64,
}

/// Storage for oracle midpoint prices, keyed by token-pair id.
#[derive(Default, Clone)]
pub struct MidpointPriceStore(Arc<RwLock<Inner>>);

impl MidpointPriceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the stored prices with the contents of `price`. No nonce
    /// check is performed here; the caller (the oracle server) enforces
    /// monotonicity before calling `put`.
    pub fn put(&self, price: &MidpointPrice) {
        let mut inner = self.0.write();
        for (token_pair, value) in price.token_pairs.iter().zip(price.prices.iter()) {
            inner.prices.insert(*token_pair, *value);
        }
        inner.nonce = price.nonce;
        metrics::gauge!(METRICS_ID_MIDPOINT_STORE_SIZE).set(inner.prices.len() as f64);
        tracing::debug!(nonce = price.nonce, pairs = price.token_pairs.len(), "midpoint price store updated");
    }

    /// Returns the known price for `token_pair`, if any.
    pub fn get(&self, token_pair: u64) -> Result<u64, MidpointPriceStoreError> {
        self.0
            .read()
            .prices
            .get(&token_pair)
            .copied()
            .ok_or(MidpointPriceStoreError::NotFound(token_pair))
    }

    /// The highest nonce observed so far. `0` if the store is empty.
    pub fn nonce(&self) -> u64 {
        self.0.read().nonce
    }

    /// Whether the store has never received a price update.
    pub fn is_empty(&self) -> bool {
        self.0.read().prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::B256;
    use alloy::signers::local::PrivateKeySigner;
    use darkpool_types::Identity;

    use super::*;

    fn price(token_pairs: Vec<u64>, prices: Vec<u64>, nonce: u64) -> MidpointPrice {
        let identity = Identity::new(PrivateKeySigner::random());
        MidpointPrice::new(token_pairs, prices, nonce, identity.sign(B256::ZERO)).unwrap()
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = MidpointPriceStore::new();
        store.put(&price(vec![1, 2], vec![100, 200], 1));
        assert_eq!(store.get(1).unwrap(), 100);
        assert_eq!(store.get(2).unwrap(), 200);
        assert_eq!(store.nonce(), 1);
    }

    #[test]
    fn get_missing_token_pair_errors() {
        let store = MidpointPriceStore::new();
        assert!(matches!(store.get(7), Err(MidpointPriceStoreError::NotFound(7))));
    }

    #[test]
    fn put_overwrites_existing_entries() {
        let store = MidpointPriceStore::new();
        store.put(&price(vec![1], vec![100], 1));
        store.put(&price(vec![1], vec![150], 2));
        assert_eq!(store.get(1).unwrap(), 150);
        assert_eq!(store.nonce(), 2);
    }
}
