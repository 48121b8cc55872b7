//! # equorum-series
//!
//! Series claim engine.
//!
//! A Series holds the share-token supply of one revenue series, converts
//! revenue deposited by its Router into a global per-share accrual, and pays
//! each holder their proportional entitlement on demand. Claims are never
//! gated by pause state or maturity: once revenue has accrued to a holder it
//! stays claimable forever.
//!
//! ## Modules
//!
//! - [`series`]: The Series contract
//! - [`holders`]: Share balances and per-holder checkpoints
//! - [`maturity`]: One-way `Active -> Matured` state

pub mod holders;
pub mod maturity;
pub mod series;

use equorum_ledger::{LedgerError, PayoutError};
use equorum_types::{Address, Amount, Timestamp};

pub use holders::{HolderAccount, HolderBook};
pub use maturity::Maturity;
pub use series::{Series, SeriesConfig, SeriesInfo};

/// Error types for Series operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    /// Caller is not the bound router.
    #[error("caller {caller} is not the authorized router")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// The series has matured and no longer accepts revenue.
    #[error("series already matured")]
    AlreadyMatured,

    /// Maturity was triggered before the maturity timestamp.
    #[error("series not yet matured: matures at {maturity_timestamp}, current time {current_time}")]
    NotYetMatured {
        /// When the series becomes maturable.
        maturity_timestamp: Timestamp,
        /// The current time.
        current_time: Timestamp,
    },

    /// Share supply is zero, so revenue cannot be attributed.
    #[error("no shares outstanding")]
    NoShares,

    /// Caller has no claimable revenue.
    #[error("nothing to claim")]
    NothingToClaim,

    /// Amount is zero.
    #[error("amount must be non-zero")]
    InvalidAmount,

    /// Address is zero.
    #[error("address must be non-zero")]
    InvalidAddress,

    /// Maturity duration is zero.
    #[error("maturity duration must be non-zero")]
    InvalidDuration,

    /// Basis points outside `1..=10000`.
    #[error("basis points must be within 1..=10000, got {0}")]
    InvalidBasisPoints(u16),

    /// Holder does not own enough shares.
    #[error("insufficient shares: have {have}, need {need}")]
    InsufficientShares {
        /// Current share balance.
        have: Amount,
        /// Requested amount.
        need: Amount,
    },

    /// Arithmetic overflow.
    #[error("arithmetic overflow in series accounting")]
    Overflow,

    /// Outbound transfer to the holder failed.
    #[error("payout failed: {0}")]
    Payout(#[from] PayoutError),
}

impl From<LedgerError> for SeriesError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidBasisPoints(bps) => SeriesError::InvalidBasisPoints(bps),
            LedgerError::NoShares => SeriesError::NoShares,
            LedgerError::Overflow | LedgerError::Underflow { .. } => SeriesError::Overflow,
        }
    }
}

/// Convenience result type for Series operations.
pub type Result<T> = std::result::Result<T, SeriesError>;
