//! Basis-point revenue split.
//!
//! The Router divides its custody into the Series' share and the remainder it
//! keeps for the protocol:
//!
//! ```text
//! to_series = floor(amount * bps / 10000)
//! remainder = amount - to_series
//! ```
//!
//! Rounding dust always stays with the remainder, so the two parts sum to
//! `amount` exactly.

use std::fmt;

use equorum_types::{Amount, BPS_DENOMINATOR, U256};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result};

/// A validated share ratio in `1..=10000` basis points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct BasisPoints(u16);

impl BasisPoints {
    /// 100%.
    pub const MAX: Self = Self(BPS_DENOMINATOR);

    /// Validate a raw basis-point value.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidBasisPoints`] if `bps` is 0 or above 10000
    pub fn new(bps: u16) -> Result<Self> {
        if bps == 0 || bps > BPS_DENOMINATOR {
            return Err(LedgerError::InvalidBasisPoints(bps));
        }
        Ok(Self(bps))
    }

    /// The raw basis-point value.
    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for BasisPoints {
    type Error = LedgerError;

    fn try_from(bps: u16) -> Result<Self> {
        Self::new(bps)
    }
}

impl From<BasisPoints> for u16 {
    fn from(bps: BasisPoints) -> u16 {
        bps.0
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.0)
    }
}

/// The two halves of a split amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Portion forwarded to the Series.
    pub to_series: Amount,
    /// Portion retained by the Router for the protocol.
    pub remainder: Amount,
}

/// Split `amount` by `bps`, flooring the Series' share.
///
/// Exact for every 256-bit amount: the product is decomposed as
/// `(q * D + r) * bps / D = q * bps + r * bps / D` with `D = 10000`, so no
/// intermediate value exceeds `amount`.
pub fn split(amount: Amount, bps: BasisPoints) -> Split {
    let denominator = U256::from(BPS_DENOMINATOR);
    let share = U256::from(bps.get());

    let quotient = amount / denominator;
    let rest = amount % denominator;
    let to_series = quotient * share + rest * share / denominator;
    let remainder = amount - to_series;

    Split {
        to_series,
        remainder,
    }
}
