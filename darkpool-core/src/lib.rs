//! Pure matcher logic: no I/O, no SMPC transport, no stores.
//!
//! Everything here is a deterministic function of its arguments so it can
//! be tested without standing up a node. The async orchestration that
//! drives real joins through this state machine lives in `darkpool-node`.

mod pipeline;
mod share_field;
mod stage;

pub use pipeline::{admission_entry_stage, decide, difference_operand, Decision, PipelineError, PriceMutation, StageContext};
pub use share_field::{is_non_negative, is_positive, is_zero};
pub use stage::{Stage, UnknownStage};
