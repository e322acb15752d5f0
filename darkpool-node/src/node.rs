//! [`DarkpoolNode`]: the top-level wiring of stores, boundary adapters, and
//! the matcher/oracle/swarm protocols into one running node.
//!
//! This returns no `axum::Router` of its own — the HTTP order-ingest
//! surface is an explicit external collaborator (spec.md §1) that embeds
//! this node as a library rather than the other way around.

use std::sync::Arc;

use darkpool_types::Identity;

use crate::config::{ConfigError, NodeConfig};
use crate::matcher::{MatchCallback, Matcher};
use crate::oracle::Oracler;
use crate::smpc::SmpcAdapter;
use crate::stores::{ComputationStore, MidpointPriceStore, MultiAddressStore};
use crate::swarm::Swarm;
use crate::transport::PeerTransport;

/// Owns every store and protocol driver a running node needs, built from a
/// validated [`NodeConfig`] plus the caller's concrete SMPC adapter and
/// peer transport.
pub struct DarkpoolNode<A: SmpcAdapter, T: PeerTransport> {
    /// Drives computations through the staged pipeline (spec.md §4.F).
    pub matcher: Matcher<A>,
    /// Swarm gossip and iterative query (spec.md §4.H).
    pub swarm: Arc<Swarm<T>>,
    /// Oracle midpoint-price gossip client/server (spec.md §4.G).
    pub oracler: Oracler<T>,
    /// The peer directory shared by swarm and oracle.
    pub addresses: MultiAddressStore,
    /// Terminal computation records (spec.md §4.D).
    pub computations: ComputationStore,
    /// Oracle midpoint prices, keyed by token pair (spec.md §4.B).
    pub midpoint_prices: MidpointPriceStore,
    config: NodeConfig,
}

impl<A: SmpcAdapter, T: PeerTransport> DarkpoolNode<A, T> {
    /// Validates `config` and assembles a node around it.
    ///
    /// Fresh, empty stores are created; a node restarting against
    /// previously persisted state is expected to re-populate them via
    /// their `put`/`insert` capability surfaces before serving traffic
    /// (persistence itself is an external key-value driver, spec.md §1).
    pub fn new(
        config: NodeConfig,
        identity: Identity,
        adapter: Arc<A>,
        transport: Arc<T>,
        callback: Arc<dyn MatchCallback>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let addresses = MultiAddressStore::new();
        let computations = ComputationStore::new();
        let midpoint_prices = MidpointPriceStore::new();

        let matcher = Matcher::new(
            adapter,
            computations.clone(),
            midpoint_prices.clone(),
            callback,
            config.smpc_network_id,
            config.prime,
        );
        let self_address = identity.address();
        let swarm = Arc::new(Swarm::new(transport.clone(), addresses.clone(), identity, config.alpha));
        let oracler = Oracler::new(
            transport,
            addresses.clone(),
            midpoint_prices.clone(),
            config.oracle_issuer,
            config.alpha,
            self_address,
        );

        Ok(Self {
            matcher,
            swarm,
            oracler,
            addresses,
            computations,
            midpoint_prices,
            config,
        })
    }

    /// Spawns this node's background ping loop. Callers hold on to the
    /// returned `JoinHandle` and await it after cancelling `cancellation`
    /// for a graceful shutdown.
    pub fn spawn_ping_loop(
        &self,
        cancellation: tokio_util::sync::CancellationToken,
    ) -> tokio::task::JoinHandle<eyre::Result<()>>
    where
        T: 'static,
    {
        let swarm = self.swarm.clone();
        let locator = self.config.network_locator.clone();
        let interval = self.config.ping_interval;
        tokio::spawn(async move { swarm.run_ping_loop(locator, interval, cancellation).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, B256};
    use alloy::signers::local::PrivateKeySigner;
    use async_trait::async_trait;
    use darkpool_types::{Join, MidpointPrice, MultiAddress};
    use std::time::Duration;

    struct NoopAdapter;

    #[async_trait]
    impl SmpcAdapter for NoopAdapter {
        async fn join(&self, _network_id: u64, _join: Join) -> Result<Vec<u64>, crate::smpc::SmpcError> {
            Ok(vec![])
        }
    }

    struct NoopTransport;

    #[async_trait]
    impl PeerTransport for NoopTransport {
        async fn ping(&self, _peer: &str, _from: &MultiAddress) -> Result<MultiAddress, crate::transport::TransportError> {
            Err(crate::transport::TransportError::Connection("noop".into(), "unreachable".into()))
        }
        async fn broadcast(&self, _peer: &str, _m: &MultiAddress) -> Result<(), crate::transport::TransportError> {
            Ok(())
        }
        async fn query(
            &self,
            _peer: &str,
            _target: Address,
        ) -> Result<crate::transport::QueryAnswer, crate::transport::TransportError> {
            Ok(Vec::new())
        }
        async fn send_midpoint_price(
            &self,
            _peer: &str,
            _price: &MidpointPrice,
        ) -> Result<(), crate::transport::TransportError> {
            Ok(())
        }
    }

    struct NoopCallback;

    #[async_trait]
    impl MatchCallback for NoopCallback {
        async fn on_resolved(&self, _computation: &darkpool_types::Computation) {}
    }

    fn config() -> NodeConfig {
        NodeConfig {
            alpha: 3,
            prime: 2_147_483_647,
            network_locator: "/ip4/127.0.0.1/tcp/1".to_owned(),
            rpc_timeout: Duration::from_secs(5),
            oracle_issuer: Address::ZERO,
            smpc_network_id: 1,
            ping_interval: Duration::from_secs(30),
        }
    }

    #[test]
    fn rejects_invalid_config_before_assembling_stores() {
        let mut bad = config();
        bad.alpha = 0;
        let identity = Identity::new(PrivateKeySigner::random());
        let result = DarkpoolNode::new(bad, identity, Arc::new(NoopAdapter), Arc::new(NoopTransport), Arc::new(NoopCallback));
        assert!(matches!(result, Err(ConfigError::ZeroAlpha)));
    }

    #[tokio::test]
    async fn assembles_with_fresh_empty_stores() {
        let identity = Identity::new(PrivateKeySigner::random());
        let node = DarkpoolNode::new(config(), identity, Arc::new(NoopAdapter), Arc::new(NoopTransport), Arc::new(NoopCallback))
            .unwrap();
        assert!(node.addresses.is_empty());
        assert!(node.midpoint_prices.is_empty());
        assert!(node.computations.get(B256::ZERO).is_err());
    }
}
