//! Thin wrapper around an ECDSA keypair used to sign and verify the two
//! gossiped wire records ([`crate::gossip::MultiAddress`] and
//! [`crate::gossip::MidpointPrice`]).
//!
//! The signing primitive itself is an external collaborator (spec.md §1);
//! this module only fixes which one (`k256`-backed ECDSA via `alloy`) and
//! the hash-then-sign / recover-then-compare pattern used throughout
//! gossip verification.

use alloy::primitives::{Address, B256, Signature, SignatureError};
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;

/// A node's signing identity. `Address` doubles as the node's peer
/// identity used throughout the swarm (spec.md §3, `MultiAddress.Address`).
#[derive(Debug, Clone)]
pub struct Identity {
    signer: PrivateKeySigner,
}

impl Identity {
    /// Wraps an already-loaded private key. Key loading itself is the
    /// external loader's responsibility (spec.md §6).
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// This identity's address, used as the peer identity in gossip.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs a 32-byte digest, producing a 65-byte ECDSA signature.
    pub fn sign(&self, hash: B256) -> Signature {
        self.signer
            .sign_hash_sync(&hash)
            .expect("signing over a fixed digest with a valid key cannot fail")
    }
}

/// Recovers the signer address from a signature over `hash`.
pub fn recover(hash: B256, signature: &Signature) -> Result<Address, SignatureError> {
    signature.recover_address_from_prehash(&hash)
}
