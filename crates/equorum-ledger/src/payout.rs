//! Outbound value transfer.
//!
//! Contracts hold their custody as a plain counter and move value out through
//! a [`Payout`] implementation supplied by the host. A recipient may refuse;
//! callers treat that as a hard failure and restore their own bookkeeping
//! before returning the error.

use std::collections::{BTreeMap, BTreeSet};

use equorum_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::{checked_accumulate, checked_debit};

/// Error returned when outbound value cannot be delivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayoutError {
    /// The recipient rejected the transfer.
    #[error("recipient {to} refused transfer of {amount}")]
    Refused {
        /// Intended recipient.
        to: Address,
        /// Amount that was not delivered.
        amount: Amount,
    },

    /// The recipient's balance would overflow.
    #[error("recipient {0} balance overflow")]
    Overflow(Address),
}

/// Host-side value transfer out of a contract's custody.
pub trait Payout {
    /// Deliver `amount` from contract `from` to `to`.
    ///
    /// # Errors
    ///
    /// - [`PayoutError::Refused`] if `to` does not accept value
    /// - [`PayoutError::Overflow`] if crediting `to` overflows
    fn pay(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), PayoutError>;
}

impl<P: Payout + ?Sized> Payout for &mut P {
    fn pay(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), PayoutError> {
        (**self).pay(from, to, amount)
    }
}

/// Native-value balances of externally owned accounts.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Accounts {
    balances: BTreeMap<Address, Amount>,
    /// Accounts that reject incoming value.
    refusing: BTreeSet<Address>,
}

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account`; zero if never funded.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Add value to `account`.
    ///
    /// # Errors
    ///
    /// - [`crate::LedgerError::Overflow`] if the balance would overflow
    pub fn credit(&mut self, account: Address, amount: Amount) -> crate::Result<()> {
        let next = checked_accumulate(self.balance_of(&account), amount)?;
        self.balances.insert(account, next);
        Ok(())
    }

    /// Remove value from `account`.
    ///
    /// # Errors
    ///
    /// - [`crate::LedgerError::Underflow`] if the balance is insufficient
    pub fn debit(&mut self, account: Address, amount: Amount) -> crate::Result<()> {
        let next = checked_debit(self.balance_of(&account), amount)?;
        self.balances.insert(account, next);
        Ok(())
    }

    /// Make `account` reject (or accept again) incoming value.
    pub fn set_refusing(&mut self, account: Address, refusing: bool) {
        if refusing {
            self.refusing.insert(account);
        } else {
            self.refusing.remove(&account);
        }
    }

    pub fn is_refusing(&self, account: &Address) -> bool {
        self.refusing.contains(account)
    }
}

impl Payout for Accounts {
    fn pay(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), PayoutError> {
        if self.is_refusing(&to) {
            tracing::debug!(%from, %to, %amount, "payout: recipient refused");
            return Err(PayoutError::Refused { to, amount });
        }
        self.credit(to, amount)
            .map_err(|_| PayoutError::Overflow(to))
    }
}
