//! Fixed-point revenue-per-share accumulator.
//!
//! A single running total replaces per-holder ledger rows. Each accepted
//! deposit `d` against a share supply `S` raises the accumulator by
//! `floor(d * SCALE / S)`; a holder's entitlement since their last checkpoint
//! is then
//!
//! ```text
//! accrued = floor(balance * (per_share - snapshot) / SCALE)
//! ```
//!
//! Claim computation is O(1) regardless of holder or deposit count. Flooring
//! on both sides means the sum of all entitlements never exceeds the sum of
//! deposits; the difference is dust that stays in custody.

use equorum_types::{Amount, ACCRUAL_SCALE, U256};
use serde::{Deserialize, Serialize};

use crate::{checked_accumulate, LedgerError, Result};

/// Per-share increment contributed by one deposit.
///
/// # Errors
///
/// - [`LedgerError::NoShares`] if `supply` is zero
/// - [`LedgerError::Overflow`] if `deposit * SCALE` does not fit in 256 bits
pub fn accrual_increment(deposit: Amount, supply: Amount) -> Result<U256> {
    if supply.is_zero() {
        return Err(LedgerError::NoShares);
    }
    let scaled = deposit
        .checked_mul(ACCRUAL_SCALE)
        .ok_or(LedgerError::Overflow)?;
    Ok(scaled / supply)
}

/// Amount accrued by `balance` shares between `snapshot` and `per_share`.
///
/// Saturates instead of failing; [`RevenueAccumulator::deposit`] keeps
/// `total_deposited * SCALE` within 256 bits, which bounds the product here.
pub fn accrued(balance: Amount, per_share: U256, snapshot: U256) -> Amount {
    let delta = per_share.saturating_sub(snapshot);
    balance.saturating_mul(delta) / ACCRUAL_SCALE
}

/// Global accrual state of one Series.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueAccumulator {
    /// Cumulative revenue per share, scaled by `ACCRUAL_SCALE`.
    per_share: U256,
    /// Sum of all accepted deposits.
    total_deposited: Amount,
}

impl RevenueAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deposit against the current share supply.
    ///
    /// Returns the new cumulative per-share value. State is untouched on
    /// error.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NoShares`] if `supply` is zero
    /// - [`LedgerError::Overflow`] if the lifetime deposit total scaled by
    ///   `SCALE` would no longer fit in 256 bits
    pub fn deposit(&mut self, amount: Amount, supply: Amount) -> Result<U256> {
        let increment = accrual_increment(amount, supply)?;
        let total_deposited = checked_accumulate(self.total_deposited, amount)?;
        total_deposited
            .checked_mul(ACCRUAL_SCALE)
            .ok_or(LedgerError::Overflow)?;
        let per_share = checked_accumulate(self.per_share, increment)?;

        self.total_deposited = total_deposited;
        self.per_share = per_share;

        tracing::trace!(
            %amount,
            %supply,
            %increment,
            %per_share,
            "accrual: deposit recorded"
        );

        Ok(per_share)
    }

    /// Amount accrued to `balance` shares since `snapshot`.
    pub fn accrued_since(&self, balance: Amount, snapshot: U256) -> Amount {
        accrued(balance, self.per_share, snapshot)
    }

    /// Current cumulative revenue per share.
    pub fn per_share(&self) -> U256 {
        self.per_share
    }

    /// Sum of all accepted deposits.
    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }
}
