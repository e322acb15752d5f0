//! The pure matcher state machine: `(Stage, revealed values) -> Decision`.
//!
//! Per the Design Notes in spec.md §9, the staged matcher is re-expressed as
//! an explicit, side-effect-free state machine instead of the
//! mutually-recursive callback style of the original. This makes every
//! stage transition testable without an SMPC transport: feed it a stage,
//! the scalar(s) a join revealed, and a little context, and it tells the
//! caller exactly what to do next. The async driver that actually submits
//! joins and commits state lives in `darkpool-node::matcher`.

use darkpool_types::{Computation, ComputationState, Share, ShareError};
use thiserror::Error;

use crate::share_field::{is_non_negative, is_positive, is_zero};
use crate::stage::{Stage, UnknownStage};

/// Context the pure pipeline needs beyond the stage and revealed values:
/// the field prime, and which side(s) of the computation are midpoint
/// orders (this determines where a midpoint stage hands off next).
#[derive(Debug, Clone, Copy)]
pub struct StageContext {
    /// The SMPC field prime, `p`.
    pub prime: u64,
    /// Whether the buy fragment is a midpoint order.
    pub buy_is_midpoint: bool,
    /// Whether the sell fragment is a midpoint order.
    pub sell_is_midpoint: bool,
}

/// Which side's price a midpoint stage decided to overwrite with the oracle
/// midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceMutation {
    /// Overwrite `Buy.Price` with the computation's midpoint price.
    BuyToMidpoint,
    /// Overwrite `Sell.Price` with the computation's midpoint price.
    SellToMidpoint,
}

/// What the caller should do after interpreting one stage's revealed
/// value(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Apply `mutate` (if any) to the computation, then submit a join for
    /// `next`.
    Continue {
        /// A price substitution to apply before moving on, if any.
        mutate: Option<PriceMutation>,
        /// The next stage to submit a join for.
        next: Stage,
    },
    /// Commit this terminal state and, for `Matched`/`Mismatched`, invoke
    /// the match callback exactly once.
    Commit(ComputationState),
    /// The join revealed nothing (`values.len() == 0`): no state change,
    /// caller should log and leave the computation in `Nil` for a later
    /// retry (spec.md §8 boundary case).
    Dropped,
}

/// Errors raised while computing a stage's difference operand.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The stage ordinal did not correspond to a known stage.
    #[error(transparent)]
    UnknownStage(#[from] UnknownStage),
    /// `Nil`/`Settlement` are not stages a join is ever built for.
    #[error("stage {0:?} has no difference operand")]
    NotApplicable(Stage),
    /// The two shares being subtracted did not share a Shamir index.
    #[error(transparent)]
    Share(#[from] ShareError),
    /// A midpoint stage was reached before `Computation::midpoint_price`
    /// was populated (spec.md §9, Open Question 2).
    #[error("midpoint price not populated on computation")]
    MidpointPriceMissing,
}

/// Interprets the revealed join value(s) for `stage` and decides what
/// happens next (spec.md §4.F branch table).
///
/// `values` is whatever the SMPC adapter's callback delivered for this
/// join. Per spec.md §4.F invariants: a non-empty `values` with more than
/// one scalar at a single-value stage is treated as indecisive, and the
/// computation falls through to `Mismatched`, exactly like an
/// out-of-range revealed scalar would.
pub fn decide(stage: Stage, values: &[u64], ctx: &StageContext) -> Decision {
    let Some(&v) = values.first() else {
        return Decision::Dropped;
    };
    if values.len() > 1 {
        tracing::warn!(?stage, len = values.len(), "join revealed more than one scalar at a single-value stage, falling through to mismatch");
        return Decision::Commit(ComputationState::Mismatched);
    }

    let prime = ctx.prime;
    match stage {
        Stage::MidpointBuyPriceExp => {
            if is_positive(v, prime) {
                Decision::Continue {
                    mutate: Some(PriceMutation::BuyToMidpoint),
                    next: after_buy_midpoint_accepted(ctx),
                }
            } else if is_zero(v, prime) {
                Decision::Continue {
                    mutate: None,
                    next: Stage::MidpointBuyPriceCo,
                }
            } else {
                Decision::Commit(ComputationState::Mismatched)
            }
        }
        Stage::MidpointBuyPriceCo => {
            if is_non_negative(v, prime) {
                Decision::Continue {
                    mutate: Some(PriceMutation::BuyToMidpoint),
                    next: after_buy_midpoint_accepted(ctx),
                }
            } else {
                Decision::Commit(ComputationState::Mismatched)
            }
        }
        Stage::MidpointSellPriceExp => {
            if is_positive(v, prime) {
                Decision::Continue {
                    mutate: Some(PriceMutation::SellToMidpoint),
                    next: after_sell_midpoint_accepted(ctx),
                }
            } else if is_zero(v, prime) {
                Decision::Continue {
                    mutate: None,
                    next: Stage::MidpointSellPriceCo,
                }
            } else {
                Decision::Commit(ComputationState::Mismatched)
            }
        }
        Stage::MidpointSellPriceCo => {
            if is_non_negative(v, prime) {
                Decision::Continue {
                    mutate: Some(PriceMutation::SellToMidpoint),
                    next: after_sell_midpoint_accepted(ctx),
                }
            } else {
                Decision::Commit(ComputationState::Mismatched)
            }
        }
        Stage::PriceExp | Stage::BuyVolumeExp | Stage::SellVolumeExp => {
            if is_positive(v, prime) {
                Decision::Continue {
                    mutate: None,
                    next: stage.skip_co(),
                }
            } else if is_zero(v, prime) {
                Decision::Continue {
                    mutate: None,
                    next: stage.descend(),
                }
            } else {
                Decision::Commit(ComputationState::Mismatched)
            }
        }
        Stage::PriceCo | Stage::BuyVolumeCo | Stage::SellVolumeCo => {
            if is_non_negative(v, prime) {
                Decision::Continue {
                    mutate: None,
                    next: stage.descend(),
                }
            } else {
                Decision::Commit(ComputationState::Mismatched)
            }
        }
        Stage::Tokens => {
            if is_zero(v, prime) {
                Decision::Commit(ComputationState::Matched)
            } else {
                Decision::Commit(ComputationState::Mismatched)
            }
        }
        Stage::Nil | Stage::Settlement => {
            tracing::error!(?stage, "decide() called on a non-pipeline stage");
            Decision::Commit(ComputationState::Mismatched)
        }
    }
}

/// After `MidpointBuyPriceExp`/`MidpointBuyPriceCo` accept the buy side's
/// midpoint price: continue to the sell side's midpoint stage if it is
/// also a midpoint order, else straight to `PriceExp`.
fn after_buy_midpoint_accepted(ctx: &StageContext) -> Stage {
    if ctx.sell_is_midpoint {
        Stage::MidpointSellPriceExp
    } else {
        Stage::PriceExp
    }
}

/// After the sell side's midpoint stages accept: continue to `PriceExp` if
/// the buy side is also midpoint (it already had its price substituted),
/// else skip straight to `BuyVolumeExp` (the buy side has nothing left to
/// decide about its own price).
fn after_sell_midpoint_accepted(ctx: &StageContext) -> Stage {
    if ctx.buy_is_midpoint {
        Stage::PriceExp
    } else {
        Stage::BuyVolumeExp
    }
}

/// The admission stage entry point: `Settlement` is a guard, never an
/// actual join stage. Returns the first real stage to enter, or `None` if
/// admission already decided `Mismatched` (differing settlement fields).
pub fn admission_entry_stage(computation: &Computation) -> Option<Stage> {
    if computation.buy.order_settlement != computation.sell.order_settlement {
        return None;
    }
    Some(if computation.buy.order_type.is_midpoint() {
        Stage::MidpointBuyPriceExp
    } else if computation.sell.order_type.is_midpoint() {
        Stage::MidpointSellPriceExp
    } else {
        Stage::PriceExp
    })
}

/// Computes the share difference a stage's join reveals (spec.md §4.F,
/// "Difference operand per stage").
///
/// For the midpoint stages this requires `computation.midpoint_price` to
/// already be populated; see [`PipelineError::MidpointPriceMissing`].
pub fn difference_operand(stage: Stage, computation: &Computation, prime: u64) -> Result<Share, PipelineError> {
    let midpoint = computation
        .midpoint_price
        .as_ref()
        .ok_or(PipelineError::MidpointPriceMissing);
    let buy = &computation.buy;
    let sell = &computation.sell;

    match stage {
        Stage::MidpointBuyPriceExp => Ok(midpoint?.exp.sub(&buy.price.exp, prime)?),
        Stage::MidpointBuyPriceCo => Ok(midpoint?.co.sub(&buy.price.co, prime)?),
        Stage::MidpointSellPriceExp => Ok(sell.price.exp.sub(&midpoint?.exp, prime)?),
        Stage::MidpointSellPriceCo => Ok(sell.price.co.sub(&midpoint?.co, prime)?),
        Stage::PriceExp => Ok(buy.price.exp.sub(&sell.price.exp, prime)?),
        Stage::PriceCo => Ok(buy.price.co.sub(&sell.price.co, prime)?),
        Stage::BuyVolumeExp => Ok(buy.volume.exp.sub(&sell.minimum_volume.exp, prime)?),
        Stage::BuyVolumeCo => Ok(buy.volume.co.sub(&sell.minimum_volume.co, prime)?),
        Stage::SellVolumeExp => Ok(sell.volume.exp.sub(&buy.minimum_volume.exp, prime)?),
        Stage::SellVolumeCo => Ok(sell.volume.co.sub(&buy.minimum_volume.co, prime)?),
        Stage::Tokens => Ok(buy.tokens.sub(&sell.tokens, prime)?),
        Stage::Nil | Stage::Settlement => Err(PipelineError::NotApplicable(stage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: StageContext = StageContext {
        prime: 101,
        buy_is_midpoint: false,
        sell_is_midpoint: false,
    };

    #[test]
    fn dropped_on_empty_values() {
        assert_eq!(decide(Stage::PriceExp, &[], &CTX), Decision::Dropped);
    }

    #[test]
    fn mismatch_on_multiple_values_at_single_value_stage() {
        assert_eq!(
            decide(Stage::PriceExp, &[1, 2], &CTX),
            Decision::Commit(ComputationState::Mismatched)
        );
    }

    #[test]
    fn price_exp_positive_skips_to_buy_volume_exp() {
        assert_eq!(
            decide(Stage::PriceExp, &[1], &CTX),
            Decision::Continue {
                mutate: None,
                next: Stage::BuyVolumeExp
            }
        );
    }

    #[test]
    fn price_exp_zero_descends_to_price_co() {
        assert_eq!(
            decide(Stage::PriceExp, &[0], &CTX),
            Decision::Continue {
                mutate: None,
                next: Stage::PriceCo
            }
        );
    }

    #[test]
    fn price_exp_negative_mismatches() {
        // prime/2 == 50, so 60 is in the negative half.
        assert_eq!(
            decide(Stage::PriceExp, &[60], &CTX),
            Decision::Commit(ComputationState::Mismatched)
        );
    }

    #[test]
    fn tokens_zero_matches() {
        assert_eq!(
            decide(Stage::Tokens, &[0], &CTX),
            Decision::Commit(ComputationState::Matched)
        );
    }

    #[test]
    fn tokens_nonzero_mismatches() {
        assert_eq!(
            decide(Stage::Tokens, &[1], &CTX),
            Decision::Commit(ComputationState::Mismatched)
        );
    }

    #[test]
    fn sell_volume_exp_positive_skips_to_tokens() {
        assert_eq!(
            decide(Stage::SellVolumeExp, &[1], &CTX),
            Decision::Continue {
                mutate: None,
                next: Stage::Tokens
            }
        );
    }

    #[test]
    fn midpoint_buy_positive_enters_midpoint_sell_when_both_sides_midpoint() {
        let ctx = StageContext {
            prime: 101,
            buy_is_midpoint: true,
            sell_is_midpoint: true,
        };
        assert_eq!(
            decide(Stage::MidpointBuyPriceExp, &[1], &ctx),
            Decision::Continue {
                mutate: Some(PriceMutation::BuyToMidpoint),
                next: Stage::MidpointSellPriceExp,
            }
        );
    }

    #[test]
    fn midpoint_buy_positive_enters_price_exp_when_sell_is_limit() {
        let ctx = StageContext {
            prime: 101,
            buy_is_midpoint: true,
            sell_is_midpoint: false,
        };
        assert_eq!(
            decide(Stage::MidpointBuyPriceExp, &[1], &ctx),
            Decision::Continue {
                mutate: Some(PriceMutation::BuyToMidpoint),
                next: Stage::PriceExp,
            }
        );
    }

    #[test]
    fn midpoint_sell_positive_skips_price_exp_when_buy_is_midpoint_too() {
        let ctx = StageContext {
            prime: 101,
            buy_is_midpoint: true,
            sell_is_midpoint: true,
        };
        assert_eq!(
            decide(Stage::MidpointSellPriceExp, &[1], &ctx),
            Decision::Continue {
                mutate: Some(PriceMutation::SellToMidpoint),
                next: Stage::PriceExp,
            }
        );
    }

    #[test]
    fn midpoint_sell_positive_enters_buy_volume_exp_when_buy_is_limit() {
        let ctx = StageContext {
            prime: 101,
            buy_is_midpoint: false,
            sell_is_midpoint: true,
        };
        assert_eq!(
            decide(Stage::MidpointSellPriceExp, &[1], &ctx),
            Decision::Continue {
                mutate: Some(PriceMutation::SellToMidpoint),
                next: Stage::BuyVolumeExp,
            }
        );
    }
}
