//! # equorum-router
//!
//! Revenue router: the custody point for inbound revenue.
//!
//! Value sent to the Router is always accepted. Routing splits custody by the
//! configured basis points and forwards the Series' share; a Series that
//! refuses the deposit is recorded as a failed attempt and the value stays in
//! custody. The protocol can withdraw what remains, and the owner has an
//! emergency sweep.
//!
//! ## Modules
//!
//! - [`router`]: The Router contract
//! - [`outcome`]: Typed result of a routing attempt
//! - [`pause`]: Pause switch gating routing only
//! - [`access`]: Per-operation capability checks

pub mod access;
pub mod outcome;
pub mod pause;
pub mod router;

use equorum_ledger::{LedgerError, PayoutError};
use equorum_types::{Address, Amount};

pub use outcome::RouteOutcome;
pub use pause::PauseSwitch;
pub use router::{Counters, Router, RouterConfig, RouterStatus};

/// Error types for Router operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// Caller lacks the role the operation requires.
    #[error("caller {caller} is not authorized")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// Routing is paused.
    #[error("router is paused")]
    Paused,

    /// Pause requested while already paused.
    #[error("router is already paused")]
    AlreadyPaused,

    /// Unpause requested while not paused.
    #[error("router is not paused")]
    NotPaused,

    /// No Series has been bound yet.
    #[error("series address not set")]
    SeriesNotSet,

    /// The supplied Series is not the bound one.
    #[error("series mismatch: bound {bound}, given {given}")]
    SeriesMismatch {
        /// The bound series.
        bound: Address,
        /// The series that was supplied.
        given: Address,
    },

    /// The Series address can only be bound once.
    #[error("series address already set")]
    AlreadySet,

    /// Address is zero.
    #[error("address must be non-zero")]
    InvalidAddress,

    /// Amount is zero.
    #[error("amount must be non-zero")]
    InvalidAmount,

    /// Withdrawal exceeds custody.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Current custody.
        have: Amount,
        /// Requested amount.
        need: Amount,
    },

    /// Custody is empty.
    #[error("router holds no balance")]
    NoBalance,

    /// Basis points outside `1..=10000`.
    #[error("basis points must be within 1..=10000, got {0}")]
    InvalidBasisPoints(u16),

    /// Arithmetic overflow.
    #[error("arithmetic overflow in router accounting")]
    Overflow,

    /// Outbound transfer failed.
    #[error("payout failed: {0}")]
    Payout(#[from] PayoutError),
}

impl From<LedgerError> for RouterError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidBasisPoints(bps) => RouterError::InvalidBasisPoints(bps),
            LedgerError::Underflow { have, need } => RouterError::InsufficientBalance { have, need },
            // The Router never runs accrual, so NoShares cannot reach here.
            LedgerError::NoShares | LedgerError::Overflow => RouterError::Overflow,
        }
    }
}

/// Convenience result type for Router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
