//! Errors shared by the data-model types in this crate.

/// Errors that can occur while constructing or operating on [`crate::share::Share`]s.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// Two shares were combined (e.g. subtracted) but did not carry the same
    /// Shamir index, so the result would not correspond to a single party.
    #[error("share index mismatch: {lhs} != {rhs}")]
    IndexMismatch {
        /// Index of the left-hand operand.
        lhs: u64,
        /// Index of the right-hand operand.
        rhs: u64,
    },
}

/// Errors that can occur while constructing a [`crate::gossip::MidpointPrice`].
#[derive(Debug, thiserror::Error)]
pub enum MidpointPriceError {
    /// `token_pairs` and `prices` were not the same length.
    #[error("token_pairs has {token_pairs} entries but prices has {prices}")]
    LengthMismatch {
        /// Number of token-pair keys.
        token_pairs: usize,
        /// Number of prices.
        prices: usize,
    },
}
