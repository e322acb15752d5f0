//! Metrics definitions for the darkpool node.
//!
//! This module defines all metrics keys used by the node and provides a
//! helper [`describe_metrics`] to set metadata for each metric using the
//! `metrics` crate.

/// Metrics key for computations committed as `Matched`.
pub const METRICS_ID_MATCHER_MATCHED: &str = "darkpool.matcher.matched";
/// Metrics key for computations committed as `Mismatched`.
pub const METRICS_ID_MATCHER_MISMATCHED: &str = "darkpool.matcher.mismatched";
/// Metrics key for computations committed as `Rejected` (expired).
pub const METRICS_ID_MATCHER_REJECTED: &str = "darkpool.matcher.rejected";
/// Metrics key for joins whose callback never fired within the driving loop.
pub const METRICS_ID_MATCHER_JOIN_DROPPED: &str = "darkpool.matcher.join_dropped";
/// Metrics key for the duration of a full computation resolution.
pub const METRICS_ID_MATCHER_RESOLVE_DURATION: &str = "darkpool.matcher.resolve.duration";

/// Metrics key for entries currently held in the midpoint price store.
pub const METRICS_ID_MIDPOINT_STORE_SIZE: &str = "darkpool.midpoint_store.size";
/// Metrics key for entries currently held in the multi-address store.
pub const METRICS_ID_ADDRESS_STORE_SIZE: &str = "darkpool.address_store.size";
/// Metrics key for terminal computations currently held in the computation store.
pub const METRICS_ID_COMPUTATION_STORE_SIZE: &str = "darkpool.computation_store.size";

/// Metrics key for midpoint prices accepted by the oracle server.
pub const METRICS_ID_ORACLE_ACCEPTED: &str = "darkpool.oracle.accepted";
/// Metrics key for midpoint prices dropped by the oracle server (stale nonce or bad signature).
pub const METRICS_ID_ORACLE_DROPPED: &str = "darkpool.oracle.dropped";

/// Metrics key for pings sent during swarm gossip.
pub const METRICS_ID_SWARM_PING_SENT: &str = "darkpool.swarm.ping.sent";
/// Metrics key for multi-addresses dropped for failing signature verification.
pub const METRICS_ID_SWARM_VERIFICATION_FAILED: &str = "darkpool.swarm.verification_failed";
/// Metrics key for the number of rounds an iterative query took to converge.
pub const METRICS_ID_SWARM_QUERY_ROUNDS: &str = "darkpool.swarm.query.rounds";

/// Describe all metrics used by the node.
///
/// Calls the `describe_*` functions from the `metrics` crate to set
/// metadata on the different metrics.
pub fn describe_metrics() {
    metrics::describe_counter!(
        METRICS_ID_MATCHER_MATCHED,
        metrics::Unit::Count,
        "Number of computations committed as Matched"
    );
    metrics::describe_counter!(
        METRICS_ID_MATCHER_MISMATCHED,
        metrics::Unit::Count,
        "Number of computations committed as Mismatched"
    );
    metrics::describe_counter!(
        METRICS_ID_MATCHER_REJECTED,
        metrics::Unit::Count,
        "Number of computations committed as Rejected"
    );
    metrics::describe_counter!(
        METRICS_ID_MATCHER_JOIN_DROPPED,
        metrics::Unit::Count,
        "Number of joins whose callback never arrived"
    );
    metrics::describe_histogram!(
        METRICS_ID_MATCHER_RESOLVE_DURATION,
        metrics::Unit::Milliseconds,
        "Duration of a full computation resolution"
    );
    metrics::describe_gauge!(
        METRICS_ID_MIDPOINT_STORE_SIZE,
        metrics::Unit::Count,
        "Number of token pairs with a known midpoint price"
    );
    metrics::describe_gauge!(
        METRICS_ID_ADDRESS_STORE_SIZE,
        metrics::Unit::Count,
        "Number of peer multi-addresses known"
    );
    metrics::describe_gauge!(
        METRICS_ID_COMPUTATION_STORE_SIZE,
        metrics::Unit::Count,
        "Number of terminal computations recorded"
    );
    metrics::describe_counter!(
        METRICS_ID_ORACLE_ACCEPTED,
        metrics::Unit::Count,
        "Number of midpoint prices accepted by the oracle server"
    );
    metrics::describe_counter!(
        METRICS_ID_ORACLE_DROPPED,
        metrics::Unit::Count,
        "Number of midpoint prices dropped for stale nonce or bad signature"
    );
    metrics::describe_counter!(
        METRICS_ID_SWARM_PING_SENT,
        metrics::Unit::Count,
        "Number of pings sent during swarm gossip"
    );
    metrics::describe_counter!(
        METRICS_ID_SWARM_VERIFICATION_FAILED,
        metrics::Unit::Count,
        "Number of multi-addresses dropped for failing signature verification"
    );
    metrics::describe_histogram!(
        METRICS_ID_SWARM_QUERY_ROUNDS,
        metrics::Unit::Count,
        "Number of rounds an iterative query took to converge"
    );
}
