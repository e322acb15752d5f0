//! [`MultiAddressStore`]: a signed, nonce-versioned peer directory
//! (spec.md §4.C). Co-owned by the swarm client and server: shared reads,
//! exclusive writes under the store's own lock; `iter()` returns a
//! snapshot so callers never hold the lock while iterating (spec.md §5).

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use darkpool_types::MultiAddress;
use parking_lot::RwLock;

use crate::metrics::METRICS_ID_ADDRESS_STORE_SIZE;

/// Errors returned by [`MultiAddressStore`].
#[derive(Debug, thiserror::Error)]
pub enum MultiAddressStoreError {
    /// No entry is known for the requested address.
    #[error("no multi-address known for {0}")]
    NotFound(Address),
}

/// Peer directory, keyed by signing address.
#[derive(Default, Clone)]
pub struct MultiAddressStore(Arc<RwLock<HashMap<Address, MultiAddress>>>);

impl MultiAddressStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `m`, overwriting any existing entry for `m.address` only if
    /// `m.nonce` is strictly greater (or no entry exists yet). Returns
    /// `true` if the store changed.
    ///
    /// Signature verification is the caller's responsibility; the store
    /// preserves whatever signature bytes it is given verbatim (spec.md
    /// §4.C).
    pub fn insert(&self, m: MultiAddress) -> bool {
        let mut inner = self.0.write();
        let changed = match inner.get(&m.address) {
            Some(existing) if existing.nonce >= m.nonce => false,
            _ => true,
        };
        if changed {
            tracing::debug!(address = %m.address, nonce = m.nonce, "multi-address store updated");
            inner.insert(m.address, m);
            metrics::gauge!(METRICS_ID_ADDRESS_STORE_SIZE).set(inner.len() as f64);
        }
        changed
    }

    /// Returns the stored entry for `address`, if any.
    pub fn get(&self, address: Address) -> Result<MultiAddress, MultiAddressStoreError> {
        self.0
            .read()
            .get(&address)
            .cloned()
            .ok_or(MultiAddressStoreError::NotFound(address))
    }

    /// A point-in-time snapshot of every stored entry. Does not hold the
    /// lock across iteration.
    pub fn iter(&self) -> Vec<MultiAddress> {
        self.0.read().values().cloned().collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Samples up to `count` entries uniformly at random, excluding
    /// `exclude`. Used to seed gossip fan-out and query work queues.
    pub fn sample(&self, count: usize, exclude: &[Address]) -> Vec<MultiAddress> {
        use rand::seq::SliceRandom;

        let candidates: Vec<MultiAddress> = self
            .0
            .read()
            .values()
            .filter(|m| !exclude.contains(&m.address))
            .cloned()
            .collect();
        let mut candidates = candidates;
        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(count);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::B256;
    use alloy::signers::local::PrivateKeySigner;
    use darkpool_types::Identity;

    use super::*;

    fn addr(identity: &Identity, nonce: u64) -> MultiAddress {
        let mut m = MultiAddress {
            address: identity.address(),
            network_locator: "/ip4/127.0.0.1/tcp/1".to_owned(),
            nonce,
            signature: identity.sign(B256::ZERO),
        };
        m.signature = identity.sign(m.hash());
        m
    }

    #[test]
    fn insert_same_address_twice_leaves_one_entry() {
        let store = MultiAddressStore::new();
        let identity = Identity::new(PrivateKeySigner::random());
        assert!(store.insert(addr(&identity, 1)));
        assert!(!store.insert(addr(&identity, 1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn insert_rejects_nonce_regression() {
        let store = MultiAddressStore::new();
        let identity = Identity::new(PrivateKeySigner::random());
        assert!(store.insert(addr(&identity, 5)));
        assert!(!store.insert(addr(&identity, 3)));
        assert_eq!(store.get(identity.address()).unwrap().nonce, 5);
    }

    #[test]
    fn insert_accepts_strictly_increasing_nonce() {
        let store = MultiAddressStore::new();
        let identity = Identity::new(PrivateKeySigner::random());
        store.insert(addr(&identity, 1));
        assert!(store.insert(addr(&identity, 2)));
        assert_eq!(store.get(identity.address()).unwrap().nonce, 2);
    }

    #[test]
    fn sample_excludes_requested_addresses() {
        let store = MultiAddressStore::new();
        let a = Identity::new(PrivateKeySigner::random());
        let b = Identity::new(PrivateKeySigner::random());
        store.insert(addr(&a, 1));
        store.insert(addr(&b, 1));
        let sampled = store.sample(5, &[a.address()]);
        assert_eq!(sampled.len(), 1);
        assert_eq!(sampled[0].address, b.address());
    }
}
