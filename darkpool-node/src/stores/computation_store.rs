//! [`ComputationStore`]: the persisted terminal-state record of each
//! computation (spec.md §4.D). Ownership of a `Computation` transfers here
//! once it reaches a terminal state; the invariant "a committed non-Nil
//! state is never overwritten" (spec.md §3) is enforced by `put`.

use std::collections::HashMap;
use std::sync::Arc;

use darkpool_types::{ComputationId, ComputationState};
use parking_lot::RwLock;

use crate::metrics::METRICS_ID_COMPUTATION_STORE_SIZE;

/// Errors returned by [`ComputationStore`].
#[derive(Debug, thiserror::Error)]
pub enum ComputationStoreError {
    /// No record exists for the requested computation id.
    #[error("no computation record for {0}")]
    NotFound(ComputationId),
    /// A `put` attempted to regress an already-terminal state back to
    /// `Nil`, or to change one terminal state into a different one.
    #[error("illegal state transition for {id}: {from:?} -> {to:?}")]
    IllegalTransition {
        id: ComputationId,
        from: ComputationState,
        to: ComputationState,
    },
}

#[derive(Clone, Copy)]
struct Record {
    state: ComputationState,
    matched: bool,
    timestamp: u64,
}

/// Persisted record of each computation's terminal state.
#[derive(Default, Clone)]
pub struct ComputationStore(Arc<RwLock<HashMap<ComputationId, Record>>>);

impl ComputationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists `(id, state, matched)` at `timestamp`.
    ///
    /// Idempotent: a `put` with the same `(id, state)` already on record is
    /// a no-op and returns `Ok(false)`. Regressing a non-`Nil` state back
    /// to `Nil`, or overwriting one terminal state with a different one,
    /// is illegal and returns [`ComputationStoreError::IllegalTransition`].
    /// Returns `Ok(true)` exactly when this call performed the `Nil ->
    /// terminal` transition, which callers use to decide whether to invoke
    /// the match callback.
    pub fn put(
        &self,
        id: ComputationId,
        state: ComputationState,
        matched: bool,
        timestamp: u64,
    ) -> Result<bool, ComputationStoreError> {
        let mut inner = self.0.write();
        match inner.get(&id) {
            Some(existing) if existing.state == state => Ok(false),
            Some(existing) if existing.state.is_terminal() => Err(ComputationStoreError::IllegalTransition {
                id,
                from: existing.state,
                to: state,
            }),
            _ => {
                inner.insert(id, Record { state, matched, timestamp });
                metrics::gauge!(METRICS_ID_COMPUTATION_STORE_SIZE).set(inner.len() as f64);
                tracing::debug!(%id, ?state, matched, "computation store committed");
                Ok(state.is_terminal())
            }
        }
    }

    /// Returns the latest recorded `(state, matched)` for `id`.
    pub fn get(&self, id: ComputationId) -> Result<(ComputationState, bool), ComputationStoreError> {
        self.0
            .read()
            .get(&id)
            .map(|record| (record.state, record.matched))
            .ok_or(ComputationStoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::B256;

    use super::*;

    #[test]
    fn put_same_state_twice_is_idempotent_no_op() {
        let store = ComputationStore::new();
        let id = B256::repeat_byte(1);
        assert!(store.put(id, ComputationState::Matched, true, 0).unwrap());
        assert!(!store.put(id, ComputationState::Matched, true, 1).unwrap());
    }

    #[test]
    fn put_rejects_regressing_to_nil() {
        let store = ComputationStore::new();
        let id = B256::repeat_byte(1);
        store.put(id, ComputationState::Mismatched, false, 0).unwrap();
        assert!(matches!(
            store.put(id, ComputationState::Nil, false, 1),
            Err(ComputationStoreError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn put_rejects_overwriting_one_terminal_state_with_another() {
        let store = ComputationStore::new();
        let id = B256::repeat_byte(1);
        store.put(id, ComputationState::Matched, true, 0).unwrap();
        assert!(matches!(
            store.put(id, ComputationState::Mismatched, false, 1),
            Err(ComputationStoreError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn get_missing_errors() {
        let store = ComputationStore::new();
        assert!(matches!(
            store.get(B256::repeat_byte(9)),
            Err(ComputationStoreError::NotFound(_))
        ));
    }
}
