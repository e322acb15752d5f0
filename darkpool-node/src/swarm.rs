//! Swarm gossip and iterative query (spec.md §4.H): the α-fanout epidemic
//! protocol that keeps [`MultiAddressStore`] eventually consistent across
//! an unreliable, partially Byzantine peer graph.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use darkpool_types::{Identity, MultiAddress};
use eyre::Context as _;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::metrics::{METRICS_ID_SWARM_PING_SENT, METRICS_ID_SWARM_QUERY_ROUNDS, METRICS_ID_SWARM_VERIFICATION_FAILED};
use crate::stores::MultiAddressStore;
use crate::transport::{PeerTransport, TransportError};

/// Errors surfaced by Swarm operations. Per spec.md §7, store errors
/// during gossip propagation are fatal to that one gossip; everything
/// else is logged and tolerated.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    /// This node has no self multi-address on record yet to ping from.
    #[error("no self multi-address on record")]
    NoSelfAddress,
    /// The requested target was never found during an iterative query.
    #[error("multi-address not found for {0}")]
    NotFound(Address),
    /// A peer-supplied multi-address did not verify against its claimed
    /// address. Distinct from `NotFound` so a caller cannot confuse a
    /// rejected forgery with a plain store miss (spec.md §7).
    #[error("multi-address for {0} did not verify")]
    VerificationFailed(Address),
}

/// The swarm gossip and query client/server.
pub struct Swarm<T: PeerTransport> {
    transport: Arc<T>,
    addresses: MultiAddressStore,
    identity: Identity,
    alpha: usize,
}

impl<T: PeerTransport> Swarm<T> {
    /// Builds a swarm driver over the given transport and address store.
    pub fn new(transport: Arc<T>, addresses: MultiAddressStore, identity: Identity, alpha: usize) -> Self {
        Self {
            transport,
            addresses,
            identity,
            alpha,
        }
    }

    fn self_address(&self) -> Address {
        self.identity.address()
    }

    /// Selects up to `alpha` peers, excluding `exclude` and self. If the
    /// known peer count is `<= alpha`, sends to all of them (spec.md §4.H
    /// `pingNodes`).
    fn pick_peers(&self, exclude: &[Address]) -> Vec<MultiAddress> {
        let mut excluded = exclude.to_vec();
        excluded.push(self.self_address());
        self.addresses.sample(self.alpha, &excluded)
    }

    /// Bumps this node's own `MultiAddress` nonce, signs it, persists it,
    /// and ships it to α peers (spec.md §4.H `Ping`).
    pub async fn ping(&self, locator: &str) -> Result<(), SwarmError> {
        let next_nonce = match self.addresses.get(self.self_address()) {
            Ok(existing) => existing.nonce + 1,
            Err(_) => 1,
        };
        let mut m = MultiAddress {
            address: self.self_address(),
            network_locator: locator.to_owned(),
            nonce: next_nonce,
            signature: self.identity.sign(alloy::primitives::B256::ZERO),
        };
        m.signature = self.identity.sign(m.hash());
        self.addresses.insert(m.clone());

        let peers = self.pick_peers(&[]);
        let mut tasks = peers
            .iter()
            .map(|peer| {
                let transport = self.transport.clone();
                let locator = peer.network_locator.clone();
                let m = m.clone();
                async move { transport.ping(&locator, &m).await }
            })
            .collect::<JoinSet<_>>();

        let mut replies = 0usize;
        while let Some(result) = tasks.join_next().await {
            metrics::counter!(METRICS_ID_SWARM_PING_SENT).increment(1);
            match result {
                Ok(Ok(pong)) => {
                    replies += 1;
                    self.accept_if_verified(pong);
                }
                Ok(Err(err)) => tracing::warn!(%err, "ping RPC failed, continuing fan-out"),
                Err(join_err) => tracing::error!(%join_err, "ping task panicked"),
            }
        }
        tracing::debug!(peers = peers.len(), replies, "ping fan-out complete");
        Ok(())
    }

    /// Answers an incoming `Ping` with our current `MultiAddress` (spec.md
    /// §4.H `Pong`), and re-gossips the sender's address iff its nonce
    /// strictly exceeds what we had on record (loop suppression).
    pub async fn handle_ping(&self, from: MultiAddress, locator: &str) -> Result<MultiAddress, SwarmError> {
        if !from.verify() {
            metrics::counter!(METRICS_ID_SWARM_VERIFICATION_FAILED).increment(1);
            tracing::warn!(address = %from.address, "ping with unverifiable signature rejected");
            return Err(SwarmError::VerificationFailed(from.address));
        }
        let is_new = self.addresses.insert(from.clone());
        let pong = self.addresses.get(self.self_address()).map_err(|_| SwarmError::NoSelfAddress)?;
        if is_new {
            self.broadcast(&from, &[from.address]).await;
        }
        let _ = locator;
        Ok(pong)
    }

    /// Re-gossips `m` to α peers, excluding `m.address` and self (spec.md
    /// §4.H `BroadcastMultiAddress`).
    pub async fn broadcast(&self, m: &MultiAddress, extra_exclude: &[Address]) {
        let mut exclude = extra_exclude.to_vec();
        exclude.push(m.address);
        let peers = self.pick_peers(&exclude);
        let mut tasks = peers
            .iter()
            .map(|peer| {
                let transport = self.transport.clone();
                let locator = peer.network_locator.clone();
                let m = m.clone();
                async move { transport.broadcast(&locator, &m).await }
            })
            .collect::<JoinSet<_>>();
        while let Some(result) = tasks.join_next().await {
            if let Ok(Err(err)) = result {
                tracing::warn!(%err, "broadcast RPC failed, continuing fan-out");
            }
        }
    }

    fn accept_if_verified(&self, m: MultiAddress) -> bool {
        if !m.verify() {
            metrics::counter!(METRICS_ID_SWARM_VERIFICATION_FAILED).increment(1);
            tracing::warn!(address = %m.address, "multi-address with bad signature dropped silently");
            return false;
        }
        self.addresses.insert(m)
    }

    /// Iterative α-fanout find-node (spec.md §4.H `Query`).
    ///
    /// Returns `target`'s `MultiAddress` as soon as it becomes known,
    /// either locally or via a peer's answer, or
    /// [`SwarmError::NotFound`] once the work queue empties.
    pub async fn query(&self, target: Address, cancellation: &CancellationToken) -> Result<MultiAddress, SwarmError> {
        if target == self.self_address() {
            return self.addresses.get(self.self_address()).map_err(|_| SwarmError::NoSelfAddress);
        }
        if let Ok(known) = self.addresses.get(target) {
            return Ok(known);
        }

        let mut seen: HashSet<Address> = HashSet::from([self.self_address()]);
        let mut queue: Vec<MultiAddress> = self.addresses.sample(self.alpha, &[self.self_address()]);
        let mut rounds = 0u64;

        while !queue.is_empty() {
            if cancellation.is_cancelled() {
                tracing::warn!("query cancelled mid-flight");
                return Err(SwarmError::NotFound(target));
            }
            rounds += 1;
            let round: Vec<MultiAddress> = queue.drain(..self.alpha.min(queue.len())).collect();
            for peer in &round {
                seen.insert(peer.address);
            }

            let mut tasks = round
                .iter()
                .map(|peer| {
                    let transport = self.transport.clone();
                    let locator = peer.network_locator.clone();
                    async move { transport.query(&locator, target).await }
                })
                .collect::<JoinSet<_>>();

            while let Some(result) = tasks.join_next().await {
                let Ok(Ok(candidates)) = result else {
                    continue;
                };
                for candidate in candidates {
                    if !candidate.verify() {
                        metrics::counter!(METRICS_ID_SWARM_VERIFICATION_FAILED).increment(1);
                        continue;
                    }
                    self.addresses.insert(candidate.clone());
                    if candidate.address == target {
                        metrics::histogram!(METRICS_ID_SWARM_QUERY_ROUNDS).record(rounds as f64);
                        return Ok(candidate);
                    }
                    if seen.insert(candidate.address) {
                        queue.push(candidate);
                    }
                }
            }

            if let Ok(found) = self.addresses.get(target) {
                metrics::histogram!(METRICS_ID_SWARM_QUERY_ROUNDS).record(rounds as f64);
                return Ok(found);
            }
        }

        metrics::histogram!(METRICS_ID_SWARM_QUERY_ROUNDS).record(rounds as f64);
        Err(SwarmError::NotFound(target))
    }

    /// Answers an incoming `Query(target)`: our stored view if known, else
    /// α random addresses for the asker to continue with (spec.md §4.H).
    /// The α-random fallback is what lets an iterative query hop through
    /// peers that do not know `target` directly.
    pub fn handle_query(&self, target: Address) -> crate::transport::QueryAnswer {
        match self.addresses.get(target) {
            Ok(found) => vec![found],
            Err(_) => self.addresses.sample(self.alpha, &[target]),
        }
    }
}

impl<T: PeerTransport + 'static> Swarm<T> {
    /// Background task that re-pings α peers every `interval` until
    /// `cancellation` fires. A single failed round is logged and
    /// tolerated (spec.md §4.H failure semantics: gossip relies on
    /// future pings to repair a dropped one), so this loop only ever
    /// returns on cancellation.
    pub async fn run_ping_loop(
        self: Arc<Self>,
        locator: String,
        interval: Duration,
        cancellation: CancellationToken,
    ) -> eyre::Result<()> {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    tracing::info!("ping loop cancelled");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.ping(&locator).await.context("periodic swarm ping") {
                        tracing::warn!(%err, "periodic ping round failed, retrying next interval");
                    }
                }
            }
        }
    }
}
