//! Store handles: narrow capability surfaces (`put`/`get`/`iter`) over
//! shared mutable state, each guarded by its own lock (spec.md §9
//! "Cross-referencing structures").

mod computation_store;
mod midpoint_price_store;
mod multi_address_store;

pub use computation_store::{ComputationStore, ComputationStoreError};
pub use midpoint_price_store::{MidpointPriceStore, MidpointPriceStoreError};
pub use multi_address_store::{MultiAddressStore, MultiAddressStoreError};
