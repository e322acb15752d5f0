//! [`Share`] and the fixed-point [`CoExp`] price representation.
//!
//! A [`Share`] is an opaque element of the prime field `GF(p)` that a single
//! party holds as its piece of a Shamir split. The actual secret-sharing and
//! field arithmetic live in the SMPC transport (out of scope here, see
//! spec.md §1); this crate only needs enough structure to compute the
//! *difference* of two shares held by the same party, which is all the
//! matcher pipeline ever does before handing a share off to be joined.

use serde::{Deserialize, Serialize};

use crate::error::ShareError;

/// One party's element of `GF(p)`, tagged with the Shamir index it belongs
/// to so that shares from different indices can never be silently combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    index: u64,
    value: u64,
}

impl Share {
    /// Wraps a raw field element already reduced modulo the configured prime.
    pub fn new(index: u64, value: u64) -> Self {
        Self { index, value }
    }

    /// Lifts a publicly known constant into this party's share at `index`.
    ///
    /// A Shamir sharing of a public constant `c` is the degree-zero
    /// polynomial `f(x) = c`; every party's evaluation of it is `c` itself,
    /// so no SMPC round-trip is needed to "share" an already-public value
    /// such as an oracle midpoint price (see DESIGN.md, Open Question 2).
    pub fn from_constant(index: u64, value: u64) -> Self {
        Self { index, value }
    }

    /// This share's Shamir index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The raw field element, reduced modulo the configured prime.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Computes `self - other`, modulo `prime`, keeping the shared index.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::IndexMismatch`] if `self` and `other` do not
    /// carry the same Shamir index.
    pub fn sub(&self, other: &Share, prime: u64) -> Result<Share, ShareError> {
        if self.index != other.index {
            return Err(ShareError::IndexMismatch {
                lhs: self.index,
                rhs: other.index,
            });
        }
        let diff = self.value % prime;
        let sub = other.value % prime;
        let value = if diff >= sub {
            diff - sub
        } else {
            prime - (sub - diff)
        };
        Ok(Share {
            index: self.index,
            value,
        })
    }
}

/// A fixed-base-10 price, `Co x 10^(Exp - 38) / 200`, as plain (revealed)
/// scalars. Used for oracle midpoint prices, which are public once gossiped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoExpValue {
    /// Coefficient.
    pub co: u64,
    /// Base-10 exponent offset.
    pub exp: i8,
}

impl CoExpValue {
    /// Creates a new `CoExpValue`.
    pub fn new(co: u64, exp: i8) -> Self {
        Self { co, exp }
    }
}

/// `CoExpValue` compares by exponent first, then coefficient (spec.md §3).
impl PartialOrd for CoExpValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CoExpValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.exp.cmp(&other.exp).then(self.co.cmp(&other.co))
    }
}

/// A `CoExp` price where both fields are still encrypted [`Share`]s in the
/// context of one computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoExpShares {
    /// Share of the coefficient.
    pub co: Share,
    /// Share of the exponent.
    pub exp: Share,
}

impl CoExpShares {
    /// Wraps a pair of shares as a `CoExp`.
    pub fn new(co: Share, exp: Share) -> Self {
        Self { co, exp }
    }

    /// Lifts a publicly known `CoExpValue` into shares at `index` (see
    /// [`Share::from_constant`]).
    ///
    /// `exp` is signed but every share value is an unsigned residue mod
    /// `prime`; a negative exponent is reduced into `[0, prime)` with
    /// `rem_euclid` rather than reinterpreting its bit pattern, so later
    /// subtractions against this share see the same residue a genuine
    /// Shamir share of `exp` would carry.
    pub fn from_constant(index: u64, value: CoExpValue, prime: u64) -> Self {
        let exp = (value.exp as i64).rem_euclid(prime as i64) as u64;
        Self {
            co: Share::from_constant(index, value.co % prime),
            exp: Share::from_constant(index, exp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_wraps_modulo_prime() {
        let prime = 101;
        let a = Share::new(3, 5);
        let b = Share::new(3, 10);
        let diff = a.sub(&b, prime).unwrap();
        assert_eq!(diff.value(), 96); // 5 - 10 mod 101
        assert_eq!(diff.index(), 3);
    }

    #[test]
    fn sub_rejects_index_mismatch() {
        let a = Share::new(1, 5);
        let b = Share::new(2, 10);
        assert!(matches!(
            a.sub(&b, 101),
            Err(ShareError::IndexMismatch { lhs: 1, rhs: 2 })
        ));
    }

    #[test]
    fn coexp_orders_by_exp_then_co() {
        let lower_exp = CoExpValue::new(u64::MAX, -10);
        let higher_exp_lower_co = CoExpValue::new(0, -5);
        assert!(lower_exp < higher_exp_lower_co);

        let a = CoExpValue::new(1, 0);
        let b = CoExpValue::new(2, 0);
        assert!(a < b);
    }
}
