//! # equorum-ledger
//!
//! Ledger primitives shared by the Router and the Series.
//!
//! All arithmetic is exact 256-bit integer math with floor rounding. Nothing
//! here holds state beyond a single value; the contracts own their custody.
//!
//! ## Modules
//!
//! - [`split`]: Basis-point revenue split
//! - [`accrual`]: Fixed-point revenue-per-share accumulator math
//! - [`payout`]: Outbound value transfer seam
//! - [`sink`]: Router-to-Series deposit boundary

pub mod accrual;
pub mod payout;
pub mod sink;
pub mod split;

use equorum_types::Amount;

pub use accrual::RevenueAccumulator;
pub use payout::{Accounts, Payout, PayoutError};
pub use sink::RevenueSink;
pub use split::{split, BasisPoints, Split};

/// Error types for ledger arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Basis points outside `1..=10000`.
    #[error("basis points must be within 1..=10000, got {0}")]
    InvalidBasisPoints(u16),

    /// Revenue cannot be attributed when the share supply is zero.
    #[error("no shares outstanding to attribute revenue to")]
    NoShares,

    /// Arithmetic overflow.
    #[error("arithmetic overflow in ledger calculation")]
    Overflow,

    /// Arithmetic underflow.
    #[error("arithmetic underflow: have {have}, need {need}")]
    Underflow {
        /// The available amount.
        have: Amount,
        /// The amount that was requested.
        need: Amount,
    },
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Add `delta` to a monotonic counter.
///
/// # Errors
///
/// - [`LedgerError::Overflow`] if the sum does not fit in 256 bits
pub fn checked_accumulate(total: Amount, delta: Amount) -> Result<Amount> {
    total.checked_add(delta).ok_or(LedgerError::Overflow)
}

/// Subtract `amount` from a balance.
///
/// # Errors
///
/// - [`LedgerError::Underflow`] if `amount > balance`
pub fn checked_debit(balance: Amount, amount: Amount) -> Result<Amount> {
    balance.checked_sub(amount).ok_or(LedgerError::Underflow {
        have: balance,
        need: amount,
    })
}
