//! Share balances and per-holder claim checkpoints.
//!
//! This is the token-balance side of the Series. Every balance change runs the
//! checkpoint hook for both parties first: accrual earned at the old balance
//! is folded into `settled` and the snapshot moves to the current per-share
//! value. A buyer therefore starts earning from the moment of transfer and
//! never inherits revenue accrued to the seller, and the seller keeps what
//! they earned while holding.

use std::collections::BTreeMap;

use equorum_ledger::{checked_accumulate, checked_debit, RevenueAccumulator};
use equorum_types::{Address, Amount, U256};
use serde::{Deserialize, Serialize};

use crate::{Result, SeriesError};

/// Share position and claim checkpoint of one holder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderAccount {
    /// Share-token balance.
    pub balance: Amount,
    /// Per-share value at the last checkpoint.
    pub snapshot: U256,
    /// Accrual realized by checkpoints but not yet paid out.
    pub settled: Amount,
}

/// All holder accounts of one Series.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HolderBook {
    accounts: BTreeMap<Address, HolderAccount>,
    total_supply: Amount,
}

impl HolderBook {
    /// Mint the whole supply to `holder`.
    pub fn with_initial_supply(holder: Address, supply: Amount) -> Self {
        let mut accounts = BTreeMap::new();
        if !supply.is_zero() {
            accounts.insert(
                holder,
                HolderAccount {
                    balance: supply,
                    ..HolderAccount::default()
                },
            );
        }
        Self {
            accounts,
            total_supply: supply,
        }
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.accounts
            .get(holder)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    /// Number of addresses with a non-empty account.
    pub fn holder_count(&self) -> usize {
        self.accounts.len()
    }

    /// Settled plus not-yet-checkpointed accrual of `holder`.
    pub fn claimable(&self, holder: &Address, accrual: &RevenueAccumulator) -> Amount {
        match self.accounts.get(holder) {
            Some(account) => account
                .settled
                .saturating_add(accrual.accrued_since(account.balance, account.snapshot)),
            None => U256::ZERO,
        }
    }

    /// Move `amount` shares from `from` to `to`, checkpointing both first.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::InvalidAddress`] if `to` is zero
    /// - [`SeriesError::InvalidAmount`] if `amount` is zero
    /// - [`SeriesError::InsufficientShares`] if `from` holds less than `amount`
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        accrual: &RevenueAccumulator,
    ) -> Result<()> {
        if to.is_zero() {
            return Err(SeriesError::InvalidAddress);
        }
        if amount.is_zero() {
            return Err(SeriesError::InvalidAmount);
        }
        let have = self.balance_of(&from);
        if have < amount {
            return Err(SeriesError::InsufficientShares { have, need: amount });
        }

        let mut sender = self.checkpointed(&from, accrual)?;
        if from == to {
            self.store(from, sender);
            return Ok(());
        }
        let mut receiver = self.checkpointed(&to, accrual)?;

        sender.balance = checked_debit(sender.balance, amount)?;
        receiver.balance = checked_accumulate(receiver.balance, amount)?;

        self.store(from, sender);
        self.store(to, receiver);
        Ok(())
    }

    /// Destroy `amount` of `holder`'s shares, checkpointing first.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::InvalidAmount`] if `amount` is zero
    /// - [`SeriesError::InsufficientShares`] if `holder` holds less than `amount`
    pub fn burn(
        &mut self,
        holder: Address,
        amount: Amount,
        accrual: &RevenueAccumulator,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(SeriesError::InvalidAmount);
        }
        let have = self.balance_of(&holder);
        if have < amount {
            return Err(SeriesError::InsufficientShares { have, need: amount });
        }

        let mut account = self.checkpointed(&holder, accrual)?;
        account.balance = checked_debit(account.balance, amount)?;
        let total_supply = checked_debit(self.total_supply, amount)?;

        self.store(holder, account);
        self.total_supply = total_supply;
        Ok(())
    }

    /// Zero out `holder`'s entitlement ahead of a payout.
    ///
    /// Returns the account as it was so a failed payout can be undone with
    /// [`HolderBook::restore`].
    pub fn checkpoint_claim(
        &mut self,
        holder: Address,
        accrual: &RevenueAccumulator,
    ) -> HolderAccount {
        let previous = self.accounts.get(&holder).cloned().unwrap_or_default();
        let current = HolderAccount {
            balance: previous.balance,
            snapshot: accrual.per_share(),
            settled: U256::ZERO,
        };
        self.store(holder, current);
        previous
    }

    /// Put back an account captured by [`HolderBook::checkpoint_claim`].
    pub fn restore(&mut self, holder: Address, account: HolderAccount) {
        self.store(holder, account);
    }

    /// Copy of `holder`'s account with accrual folded into `settled`.
    fn checkpointed(
        &self,
        holder: &Address,
        accrual: &RevenueAccumulator,
    ) -> Result<HolderAccount> {
        let account = self.accounts.get(holder).cloned().unwrap_or_default();
        let earned = accrual.accrued_since(account.balance, account.snapshot);
        Ok(HolderAccount {
            balance: account.balance,
            snapshot: accrual.per_share(),
            settled: checked_accumulate(account.settled, earned)?,
        })
    }

    fn store(&mut self, holder: Address, account: HolderAccount) {
        if account == HolderAccount::default() {
            self.accounts.remove(&holder);
        } else {
            self.accounts.insert(holder, account);
        }
    }
}
