//! The stateful dark-pool node: stores, the SMPC/peer-transport
//! boundaries, and the two protocols built on top of them — the matcher
//! pipeline (spec.md §4.F) and the swarm/oracle gossip substrate (§4.G,
//! §4.H). `darkpool-core` supplies the pure logic this crate drives
//! against real stores and async I/O.

pub mod config;
pub mod matcher;
pub mod metrics;
pub mod node;
pub mod oracle;
pub mod smpc;
pub mod stores;
pub mod swarm;
pub mod transport;

pub use config::{ConfigError, NodeConfig, NodeIdentity};
pub use matcher::{MatchCallback, Matcher, MatcherError};
pub use node::DarkpoolNode;
pub use oracle::{OracleError, Oracler};
pub use smpc::{SmpcAdapter, SmpcError};
pub use swarm::{Swarm, SwarmError};
pub use transport::{PeerTransport, QueryAnswer, TransportError};
