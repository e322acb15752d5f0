//! Oracle gossip (spec.md §4.G): nonce-guarded midpoint-price dissemination
//! to α peers. A single trusted issuer key publishes `MidpointPrice`
//! updates; the client fans a freshly-signed update out to α random
//! peers, and the server re-gossips anything strictly newer than what it
//! already has (loop suppression) while dropping everything else.

use std::sync::Arc;

use alloy::primitives::Address;
use darkpool_types::MidpointPrice;
use tokio::task::JoinSet;

use crate::metrics::{METRICS_ID_ORACLE_ACCEPTED, METRICS_ID_ORACLE_DROPPED};
use crate::stores::{MidpointPriceStore, MultiAddressStore};
use crate::transport::{PeerTransport, TransportError};

/// Errors surfaced by [`Oracler`] operations.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// `price` did not verify against the configured trusted issuer.
    #[error("midpoint price signature did not verify against the trusted issuer")]
    VerificationFailed,
    /// A peer RPC during fan-out failed. Carried only for the first error
    /// observed; fan-out itself continues regardless (spec.md §4.G).
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Oracle gossip client and server, sharing one [`MidpointPriceStore`] and
/// the same [`MultiAddressStore`] swarm uses to pick peers.
pub struct Oracler<T: PeerTransport> {
    transport: Arc<T>,
    addresses: MultiAddressStore,
    prices: MidpointPriceStore,
    issuer: Address,
    alpha: usize,
    self_address: Address,
}

impl<T: PeerTransport> Oracler<T> {
    /// Builds an oracle gossip client/server over the given transport,
    /// address store, and price store. `issuer` is the single trusted
    /// oracle identity (spec.md §4.G trusted-issuer model); signatures
    /// from any other key are rejected. `self_address` is this node's own
    /// advertised address, excluded from peer sampling the same way
    /// `Swarm::pick_peers` excludes it (spec.md §4.G "excluding self").
    pub fn new(
        transport: Arc<T>,
        addresses: MultiAddressStore,
        prices: MidpointPriceStore,
        issuer: Address,
        alpha: usize,
        self_address: Address,
    ) -> Self {
        Self {
            transport,
            addresses,
            prices,
            issuer,
            alpha,
            self_address,
        }
    }

    /// Client side: selects α random peers excluding self and ships
    /// `price` to each in parallel. Returns the first transport error
    /// observed, if any; the fan-out itself always runs to completion
    /// (spec.md §4.G).
    #[tracing::instrument(skip_all, fields(nonce = price.nonce))]
    pub async fn update_midpoint(&self, price: &MidpointPrice) -> Result<(), OracleError> {
        let peers = self.addresses.sample(self.alpha, &[self.self_address]);
        let mut tasks = peers
            .iter()
            .map(|peer| {
                let transport = self.transport.clone();
                let locator = peer.network_locator.clone();
                let price = price.clone();
                async move { transport.send_midpoint_price(&locator, &price).await }
            })
            .collect::<JoinSet<_>>();

        let mut first_error = None;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(%err, "midpoint price gossip RPC failed, continuing fan-out");
                    first_error.get_or_insert(err);
                }
                Err(join_err) => tracing::error!(%join_err, "midpoint price gossip task panicked"),
            }
        }
        tracing::debug!(peers = peers.len(), "midpoint price fan-out complete");
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Server side: verifies `price` against the trusted issuer, compares
    /// its nonce against the stored one, and either persists-and-regossips
    /// (strictly newer, or store empty) or drops silently (stale nonce),
    /// per spec.md §4.G.
    #[tracing::instrument(skip_all, fields(nonce = price.nonce))]
    pub async fn handle_midpoint_price(&self, price: MidpointPrice) -> Result<(), OracleError> {
        if !price.verify(self.issuer) {
            metrics::counter!(METRICS_ID_ORACLE_DROPPED).increment(1);
            tracing::warn!("midpoint price with unverifiable signature rejected");
            return Err(OracleError::VerificationFailed);
        }

        if !self.prices.is_empty() && price.nonce <= self.prices.nonce() {
            metrics::counter!(METRICS_ID_ORACLE_DROPPED).increment(1);
            tracing::debug!(stored_nonce = self.prices.nonce(), "stale midpoint price dropped, not re-gossiped");
            return Ok(());
        }

        self.prices.put(&price);
        metrics::counter!(METRICS_ID_ORACLE_ACCEPTED).increment(1);
        self.update_midpoint(&price).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;
    use alloy::signers::local::PrivateKeySigner;
    use async_trait::async_trait;
    use darkpool_types::{Identity, MultiAddress};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        sends: AtomicUsize,
        recipients: parking_lot::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PeerTransport for CountingTransport {
        async fn ping(&self, _peer: &str, _from: &MultiAddress) -> Result<MultiAddress, TransportError> {
            Err(TransportError::Connection("noop".into(), "unreachable".into()))
        }
        async fn broadcast(&self, _peer: &str, _m: &MultiAddress) -> Result<(), TransportError> {
            Ok(())
        }
        async fn query(&self, _peer: &str, _target: Address) -> Result<crate::transport::QueryAnswer, TransportError> {
            Ok(Vec::new())
        }
        async fn send_midpoint_price(&self, peer: &str, _price: &MidpointPrice) -> Result<(), TransportError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.recipients.lock().push(peer.to_owned());
            Ok(())
        }
    }

    fn signed_price(issuer: &Identity, nonce: u64) -> MidpointPrice {
        let mut price = MidpointPrice::new(vec![1], vec![100], nonce, issuer.sign(B256::ZERO)).unwrap();
        price.signature = issuer.sign(price.hash());
        price
    }

    fn seed_peer(addresses: &MultiAddressStore) {
        let peer = Identity::new(PrivateKeySigner::random());
        let mut m = MultiAddress {
            address: peer.address(),
            network_locator: "/ip4/127.0.0.1/tcp/1".to_owned(),
            nonce: 1,
            signature: peer.sign(B256::ZERO),
        };
        m.signature = peer.sign(m.hash());
        addresses.insert(m);
    }

    #[tokio::test]
    async fn accepts_and_regossips_first_price() {
        let issuer = Identity::new(PrivateKeySigner::random());
        let addresses = MultiAddressStore::new();
        seed_peer(&addresses);
        let prices = MidpointPriceStore::new();
        let transport = Arc::new(CountingTransport { sends: AtomicUsize::new(0), recipients: parking_lot::Mutex::new(Vec::new()) });
        let self_address = Identity::new(PrivateKeySigner::random()).address();
        let oracler = Oracler::new(transport.clone(), addresses, prices.clone(), issuer.address(), 3, self_address);

        oracler.handle_midpoint_price(signed_price(&issuer, 1)).await.unwrap();
        assert_eq!(prices.get(1).unwrap(), 100);
        assert_eq!(transport.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drops_stale_nonce_without_regossip() {
        let issuer = Identity::new(PrivateKeySigner::random());
        let addresses = MultiAddressStore::new();
        seed_peer(&addresses);
        let prices = MidpointPriceStore::new();
        let transport = Arc::new(CountingTransport { sends: AtomicUsize::new(0), recipients: parking_lot::Mutex::new(Vec::new()) });
        let self_address = Identity::new(PrivateKeySigner::random()).address();
        let oracler = Oracler::new(transport.clone(), addresses, prices.clone(), issuer.address(), 3, self_address);

        oracler.handle_midpoint_price(signed_price(&issuer, 5)).await.unwrap();
        oracler.handle_midpoint_price(signed_price(&issuer, 5)).await.unwrap();
        assert_eq!(transport.sends.load(Ordering::SeqCst), 1, "equal nonce must not re-gossip");
    }

    #[tokio::test]
    async fn update_midpoint_never_gossips_to_self() {
        let issuer = Identity::new(PrivateKeySigner::random());
        let addresses = MultiAddressStore::new();
        let prices = MidpointPriceStore::new();
        let self_identity = Identity::new(PrivateKeySigner::random());
        let self_locator = "/ip4/127.0.0.1/tcp/9".to_owned();
        let mut own = MultiAddress {
            address: self_identity.address(),
            network_locator: self_locator.clone(),
            nonce: 1,
            signature: self_identity.sign(B256::ZERO),
        };
        own.signature = self_identity.sign(own.hash());
        addresses.insert(own);
        seed_peer(&addresses);

        let transport = Arc::new(CountingTransport { sends: AtomicUsize::new(0), recipients: parking_lot::Mutex::new(Vec::new()) });
        let oracler = Oracler::new(transport.clone(), addresses, prices, issuer.address(), 3, self_identity.address());

        oracler.update_midpoint(&signed_price(&issuer, 1)).await.unwrap();
        assert!(!transport.recipients.lock().contains(&self_locator), "must never gossip the price to its own advertised address");
    }

    #[tokio::test]
    async fn rejects_price_from_untrusted_signer() {
        let issuer = Identity::new(PrivateKeySigner::random());
        let impostor = Identity::new(PrivateKeySigner::random());
        let addresses = MultiAddressStore::new();
        let prices = MidpointPriceStore::new();
        let transport = Arc::new(CountingTransport { sends: AtomicUsize::new(0), recipients: parking_lot::Mutex::new(Vec::new()) });
        let self_address = Identity::new(PrivateKeySigner::random()).address();
        let oracler = Oracler::new(transport, addresses, prices.clone(), issuer.address(), 3, self_address);

        let result = oracler.handle_midpoint_price(signed_price(&impostor, 1)).await;
        assert!(matches!(result, Err(OracleError::VerificationFailed)));
        assert!(prices.is_empty());
    }
}
