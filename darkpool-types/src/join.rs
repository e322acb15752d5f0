//! [`Join`]: a request to the SMPC layer to reveal a share difference.

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

use crate::computation::ComputationId;
use crate::share::Share;

/// Identifies a join uniquely across `(computation, stage)` so that
/// concurrent stages never alias (spec.md §4.F).
///
/// Wire layout: 32 bytes of computation ID, followed by 1 stage byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinId([u8; 33]);

impl JoinId {
    /// Builds a join ID from a computation ID and a stage ordinal byte.
    pub fn new(computation_id: ComputationId, stage_byte: u8) -> Self {
        let mut bytes = [0u8; 33];
        bytes[..32].copy_from_slice(computation_id.as_slice());
        bytes[32] = stage_byte;
        Self(bytes)
    }

    /// The computation ID half of this join ID.
    pub fn computation_id(&self) -> ComputationId {
        B256::from_slice(&self.0[..32])
    }

    /// The stage-ordinal byte half of this join ID.
    pub fn stage_byte(&self) -> u8 {
        self.0[32]
    }

    /// Raw 33-byte wire representation.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }
}

/// A request to the SMPC layer to reveal the scalar value of a share
/// difference (spec.md §4.E/§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Join {
    /// Uniquely identifies this join within its computation.
    pub id: JoinId,
    /// This peer's share index.
    pub index: u64,
    /// The share(s) being revealed. Len 1 for the comparison stages defined
    /// here.
    pub shares: Vec<Share>,
}

impl Join {
    /// Builds a single-share join for one comparison stage.
    pub fn single(id: JoinId, index: u64, share: Share) -> Self {
        Self {
            id,
            index,
            shares: vec![share],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_id_round_trips_fields() {
        let computation_id = ComputationId::repeat_byte(0x42);
        let id = JoinId::new(computation_id, 7);
        assert_eq!(id.computation_id(), computation_id);
        assert_eq!(id.stage_byte(), 7);
    }

    #[test]
    fn join_round_trips_through_json() {
        let id = JoinId::new(ComputationId::repeat_byte(0x01), 5);
        let join = Join::single(id, 3, Share::new(3, 17));
        let encoded = serde_json::to_string(&join).unwrap();
        let decoded: Join = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.id, join.id);
        assert_eq!(decoded.index, join.index);
        assert_eq!(decoded.shares, join.shares);
    }
}
