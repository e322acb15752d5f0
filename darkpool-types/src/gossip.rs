//! Wire records exchanged by the gossip substrate: [`MultiAddress`] (peer
//! directory entries) and [`MidpointPrice`] (oracle price updates).
//!
//! Both are signed, nonce-versioned records with the same shape of
//! invariant: a store never regresses a known entry's nonce, and the hash
//! that gets signed is a fixed concatenation of big-endian fields (spec.md
//! §6), grounded on the single-owner-chunk signing pattern used elsewhere
//! in this corpus for "small signed, nonced record" types.

use alloy::primitives::{Address, B256, Keccak256, Signature};
use serde::{Deserialize, Serialize};

use crate::error::MidpointPriceError;

/// A peer's address in the overlay: its identity, a locator for the
/// network transport, and a signed, monotonic nonce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiAddress {
    /// The peer's identity (also its signing address).
    pub address: Address,
    /// Opaque locator string for the underlying network transport, e.g.
    /// `"/ip4/203.0.113.5/tcp/30333"`.
    pub network_locator: String,
    /// Monotonically advancing per-issuer version counter.
    pub nonce: u64,
    /// ECDSA signature over [`MultiAddress::hash`].
    pub signature: Signature,
}

impl MultiAddress {
    /// `keccak256(Address || NetworkLocator || BE64(Nonce))` (spec.md §6).
    /// Exact byte layout must match the signer.
    pub fn hash(&self) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.address);
        hasher.update(self.network_locator.as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        hasher.finalize()
    }

    /// Recovers and checks the signer against [`MultiAddress::address`].
    pub fn verify(&self) -> bool {
        match crate::identity::recover(self.hash(), &self.signature) {
            Ok(recovered) => recovered == self.address,
            Err(_) => false,
        }
    }
}

/// A batch of oracle midpoint prices, keyed by token-pair identifier, with
/// a signed, monotonic nonce (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidpointPrice {
    /// Token-pair identifiers, ordered the same as `prices`.
    pub token_pairs: Vec<u64>,
    /// Prices, parallel to `token_pairs`.
    pub prices: Vec<u64>,
    /// Monotonically advancing nonce for the issuing oracle.
    pub nonce: u64,
    /// ECDSA signature over [`MidpointPrice::hash`].
    pub signature: Signature,
}

impl MidpointPrice {
    /// Builds a `MidpointPrice`, checking that `token_pairs` and `prices`
    /// have matching lengths before the caller signs and attaches a
    /// signature.
    pub fn new(
        token_pairs: Vec<u64>,
        prices: Vec<u64>,
        nonce: u64,
        signature: Signature,
    ) -> Result<Self, MidpointPriceError> {
        if token_pairs.len() != prices.len() {
            return Err(MidpointPriceError::LengthMismatch {
                token_pairs: token_pairs.len(),
                prices: prices.len(),
            });
        }
        Ok(Self {
            token_pairs,
            prices,
            nonce,
            signature,
        })
    }

    /// Concatenate all `TokenPairs`, then all `Prices`, then `BE64(Nonce)`
    /// (spec.md §6). Exact byte layout must match the signer.
    pub fn hash(&self) -> B256 {
        let mut hasher = Keccak256::new();
        for token_pair in &self.token_pairs {
            hasher.update(token_pair.to_be_bytes());
        }
        for price in &self.prices {
            hasher.update(price.to_be_bytes());
        }
        hasher.update(self.nonce.to_be_bytes());
        hasher.finalize()
    }

    /// Recovers the signer and checks it against `expected_issuer` — the
    /// single trusted oracle identity (spec.md §4.G: trusted-issuer model).
    pub fn verify(&self, expected_issuer: Address) -> bool {
        match crate::identity::recover(self.hash(), &self.signature) {
            Ok(recovered) => recovered == expected_issuer,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use alloy::signers::local::PrivateKeySigner;

    fn test_identity() -> Identity {
        Identity::new(PrivateKeySigner::random())
    }

    #[test]
    fn multi_address_round_trips_signature() {
        let identity = test_identity();
        let mut m = MultiAddress {
            address: identity.address(),
            network_locator: "/ip4/127.0.0.1/tcp/1234".to_owned(),
            nonce: 1,
            signature: identity.sign(B256::ZERO),
        };
        m.signature = identity.sign(m.hash());
        assert!(m.verify());

        m.nonce = 2;
        assert!(!m.verify(), "stale signature must not verify after mutation");
    }

    #[test]
    fn midpoint_price_requires_equal_length_vectors() {
        let identity = test_identity();
        let err = MidpointPrice::new(vec![1, 2], vec![1], 0, identity.sign(B256::ZERO));
        assert!(matches!(
            err,
            Err(MidpointPriceError::LengthMismatch {
                token_pairs: 2,
                prices: 1
            })
        ));
    }

    #[test]
    fn midpoint_price_verifies_against_issuer() {
        let issuer = test_identity();
        let other = test_identity();
        let mut price = MidpointPrice::new(vec![1], vec![100], 1, issuer.sign(B256::ZERO)).unwrap();
        price.signature = issuer.sign(price.hash());
        assert!(price.verify(issuer.address()));
        assert!(!price.verify(other.address()));
    }
}
