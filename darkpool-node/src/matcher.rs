//! The async Matcher (spec.md §4.F): drives a [`Computation`] through the
//! staged pipeline in `darkpool-core`, submitting one [`Join`] per stage to
//! the injected [`SmpcAdapter`] and committing exactly one terminal state
//! via [`ComputationStore`].
//!
//! The pure branch logic lives in `darkpool-core::pipeline`; this module is
//! only the orchestration shell around it — submit join, await revealed
//! values, feed them to `decide`, apply the resulting mutation or commit.
//! This mirrors the Design Notes' re-architecture of the original's
//! mutually-recursive callbacks into an explicit `(Computation, Stage) ->
//! Decision` state machine (spec.md §9).

use std::sync::Arc;

use async_trait::async_trait;
use darkpool_core::{admission_entry_stage, decide, difference_operand, Decision, PriceMutation, StageContext};
use darkpool_types::{Computation, ComputationState, Join, JoinId};

use crate::metrics::{
    METRICS_ID_MATCHER_JOIN_DROPPED, METRICS_ID_MATCHER_MATCHED, METRICS_ID_MATCHER_MISMATCHED,
    METRICS_ID_MATCHER_REJECTED, METRICS_ID_MATCHER_RESOLVE_DURATION,
};
use crate::smpc::{SmpcAdapter, SmpcError};
use crate::stores::{ComputationStore, ComputationStoreError, MidpointPriceStore, MidpointPriceStoreError};

/// Exponent used when lifting a raw oracle `u64` price (spec.md §3
/// `MidpointPrice.Prices`) into a `CoExpValue`. The oracle feed carries no
/// exponent of its own; fixing it at the representation's own zero-point
/// (`Exp == 38`, per spec.md §3's `Co x 10^(Exp-38)/200` formula) treats
/// the published price as already scaled by the fixed `/200` factor.
const CANONICAL_MIDPOINT_EXP: i8 = 38;

/// Errors the Matcher surfaces at its orchestration boundary. Aggregates
/// the typed store/adapter errors; callers that just need to log and
/// retry later can use `eyre::Result` at the call site instead (spec.md
/// "ambient stack": orchestration edges use `eyre`).
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// The SMPC adapter rejected or failed to complete a join submission.
    #[error(transparent)]
    Smpc(#[from] SmpcError),
    /// A store operation failed (computation store conflict, typically).
    #[error(transparent)]
    ComputationStore(#[from] ComputationStoreError),
}

/// Invoked exactly once per computation that reaches `Matched` or
/// `Mismatched` (never for `Rejected`), per spec.md §4.F/§8 invariant 2.
#[async_trait]
pub trait MatchCallback: Send + Sync {
    /// Notified with the final computation (state already committed).
    async fn on_resolved(&self, computation: &Computation);
}

/// Drives computations through the staged pipeline.
pub struct Matcher<A: SmpcAdapter> {
    adapter: Arc<A>,
    computations: ComputationStore,
    midpoint_prices: MidpointPriceStore,
    callback: Arc<dyn MatchCallback>,
    network_id: u64,
    prime: u64,
}

impl<A: SmpcAdapter> Matcher<A> {
    /// Builds a matcher over the given stores, SMPC adapter, and match
    /// callback.
    pub fn new(
        adapter: Arc<A>,
        computations: ComputationStore,
        midpoint_prices: MidpointPriceStore,
        callback: Arc<dyn MatchCallback>,
        network_id: u64,
        prime: u64,
    ) -> Self {
        Self {
            adapter,
            computations,
            midpoint_prices,
            callback,
            network_id,
            prime,
        }
    }

    /// Resolves `computation` to a terminal state, committing it exactly
    /// once and invoking the match callback exactly once for
    /// `Matched`/`Mismatched` (never for `Rejected`).
    ///
    /// Idempotent: if the computation store already holds a terminal
    /// state for this id, this call is a no-op (spec.md §8 round-trip
    /// law).
    #[tracing::instrument(skip_all, fields(id = %computation.id))]
    pub async fn resolve(&self, mut computation: Computation) -> Result<(), MatcherError> {
        if let Ok((state, _)) = self.computations.get(computation.id) {
            if state.is_terminal() {
                tracing::debug!(?state, "computation already terminal, no-op");
                return Ok(());
            }
        }

        let started = std::time::Instant::now();
        let result = self.resolve_inner(&mut computation).await;
        metrics::histogram!(METRICS_ID_MATCHER_RESOLVE_DURATION).record(started.elapsed().as_millis() as f64);
        result
    }

    async fn resolve_inner(&self, computation: &mut Computation) -> Result<(), MatcherError> {
        let Some(mut stage) = admission_entry_stage(computation) else {
            self.commit(computation, ComputationState::Mismatched).await?;
            return Ok(());
        };
        let ctx = StageContext {
            prime: self.prime,
            buy_is_midpoint: computation.buy.order_type.is_midpoint(),
            sell_is_midpoint: computation.sell.order_type.is_midpoint(),
        };

        loop {
            let now = current_timestamp();
            if computation.buy.is_expired(now) || computation.sell.is_expired(now) {
                tracing::debug!(?stage, "computation expired before stage entry");
                self.commit_rejected(computation).await?;
                return Ok(());
            }

            if matches!(
                stage,
                darkpool_core::Stage::MidpointBuyPriceExp | darkpool_core::Stage::MidpointSellPriceExp
            ) && computation.midpoint_price.is_none()
            {
                match self.populate_midpoint_price(computation) {
                    Ok(()) => {}
                    Err(err) => {
                        tracing::warn!(%err, "midpoint price lookup failed, committing mismatch");
                        self.commit(computation, ComputationState::Mismatched).await?;
                        return Ok(());
                    }
                }
            }

            let share = match difference_operand(stage, computation, self.prime) {
                Ok(share) => share,
                Err(err) => {
                    tracing::error!(%err, ?stage, "unexpected stage while building difference operand");
                    self.commit(computation, ComputationState::Mismatched).await?;
                    return Ok(());
                }
            };

            let join_id = JoinId::new(computation.id, stage.ordinal());
            let join = Join::single(join_id, share.index(), share);
            let values = match self.adapter.join(self.network_id, join).await {
                Ok(values) => values,
                Err(err) => {
                    tracing::error!(%err, ?stage, "join submission failed, leaving computation in Nil");
                    return Err(err.into());
                }
            };

            match decide(stage, &values, &ctx) {
                Decision::Dropped => {
                    metrics::counter!(METRICS_ID_MATCHER_JOIN_DROPPED).increment(1);
                    tracing::warn!(?stage, "join revealed no values, leaving computation in Nil for retry");
                    return Ok(());
                }
                Decision::Continue { mutate, next } => {
                    if let Some(mutation) = mutate {
                        apply_mutation(computation, mutation);
                    }
                    stage = next;
                }
                Decision::Commit(state) => {
                    self.commit(computation, state).await?;
                    return Ok(());
                }
            }
        }
    }

    /// Looks up the oracle midpoint price for this computation's token
    /// pair and lifts it into the per-party share the pipeline subtracts
    /// against (spec.md §9, Open Question 2).
    ///
    /// The oracle feed only ever publishes a raw `u64` price per token
    /// pair (spec.md §3 `MidpointPrice`), so it is taken as the `Co`
    /// coefficient at the canonical exponent `CANONICAL_MIDPOINT_EXP`
    /// (see DESIGN.md).
    fn populate_midpoint_price(&self, computation: &mut Computation) -> Result<(), MidpointPriceStoreError> {
        let co = self.midpoint_prices.get(computation.buy.token_pair)?;
        let index = computation.buy.price.exp.index();
        let value = darkpool_types::CoExpValue::new(co, CANONICAL_MIDPOINT_EXP);
        computation.midpoint_price = Some(darkpool_types::CoExpShares::from_constant(index, value, self.prime));
        Ok(())
    }

    async fn commit_rejected(&self, computation: &Computation) -> Result<(), MatcherError> {
        self.computations
            .put(computation.id, ComputationState::Rejected, false, current_timestamp())?;
        metrics::counter!(METRICS_ID_MATCHER_REJECTED).increment(1);
        Ok(())
    }

    async fn commit(&self, computation: &Computation, state: ComputationState) -> Result<(), MatcherError> {
        let matched = matches!(state, ComputationState::Matched);
        let fresh = self
            .computations
            .put(computation.id, state, matched, current_timestamp())?;
        match state {
            ComputationState::Matched => metrics::counter!(METRICS_ID_MATCHER_MATCHED).increment(1),
            ComputationState::Mismatched => metrics::counter!(METRICS_ID_MATCHER_MISMATCHED).increment(1),
            ComputationState::Rejected => metrics::counter!(METRICS_ID_MATCHER_REJECTED).increment(1),
            ComputationState::Nil => {}
        }
        if fresh && matches!(state, ComputationState::Matched | ComputationState::Mismatched) {
            let mut resolved = computation.clone();
            resolved.state = state;
            resolved.matched = matched;
            self.callback.on_resolved(&resolved).await;
        }
        Ok(())
    }
}

fn apply_mutation(computation: &mut Computation, mutation: PriceMutation) {
    let Some(midpoint) = computation.midpoint_price.clone() else {
        return;
    };
    match mutation {
        PriceMutation::BuyToMidpoint => computation.buy.price = midpoint,
        PriceMutation::SellToMidpoint => computation.sell.price = midpoint,
    }
}

fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
