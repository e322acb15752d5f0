//! Node configuration.
//!
//! This struct carries no `#[clap(...)]` attributes. CLI parsing and
//! environment/file loading are an external loader's job; this core only
//! describes the shape that loader must produce.

use std::time::Duration;

use darkpool_types::Identity;
use serde::{Deserialize, Serialize};

/// Configuration the matcher and gossip layers need to operate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Gossip fan-out breadth, typically 3-6.
    pub alpha: usize,
    /// The SMPC field prime `p`. Must satisfy `p/2 < 2^63` so half-field
    /// comparisons stay unambiguous.
    pub prime: u64,
    /// This node's network locator, advertised in its own `MultiAddress`.
    pub network_locator: String,
    /// Timeout applied to a single swarm RPC (ping, pong, or query hop).
    pub rpc_timeout: Duration,
    /// Address of the trusted oracle issuer. Midpoint price gossip from any
    /// other signer is rejected.
    pub oracle_issuer: alloy::primitives::Address,
    /// The SMPC network this node submits joins against (spec.md §4.E
    /// `Join(networkID, ...)`).
    pub smpc_network_id: u64,
    /// Interval between this node's own periodic `Ping` rounds.
    pub ping_interval: Duration,
}

impl NodeConfig {
    /// Asserts the prime satisfies the half-field comparison precondition
    /// (`p/2 < 2^63`). The loader should call this once after parsing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prime / 2 >= 1u64 << 63 {
            return Err(ConfigError::PrimeTooLarge(self.prime));
        }
        if self.alpha == 0 {
            return Err(ConfigError::ZeroAlpha);
        }
        Ok(())
    }
}

/// Errors in a loaded [`NodeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `prime / 2` did not fit the half-field comparison precondition.
    #[error("prime {0} violates p/2 < 2^63")]
    PrimeTooLarge(u64),
    /// Gossip fan-out must be at least 1.
    #[error("alpha must be positive")]
    ZeroAlpha,
}

/// This node's signing identity, kept separate from the serializable
/// config since a private key should never round-trip through `serde`.
#[derive(Clone)]
pub struct NodeIdentity(pub Identity);
