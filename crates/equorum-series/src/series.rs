//! The Series contract.
//!
//! Only the bound Router may deposit revenue, and only while the series is
//! `Active`. Holders claim directly at any time; nothing here consults a
//! pause flag.
//!
//! ## Claim formula
//!
//! ```text
//! claimable = settled + balance * (per_share - snapshot) / SCALE
//! ```

use equorum_ledger::{
    checked_accumulate, checked_debit, BasisPoints, Payout, RevenueAccumulator, RevenueSink,
};
use equorum_types::events::{Event, EventKind, EventLog};
use equorum_types::{Address, Amount, Timestamp, U256};
use serde::{Deserialize, Serialize};

use crate::holders::HolderBook;
use crate::maturity::Maturity;
use crate::{Result, SeriesError};

/// Constructor parameters for a Series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Share-token name.
    pub name: String,
    /// Share-token symbol.
    pub symbol: String,
    /// Issuing protocol.
    pub protocol: Address,
    /// The only address allowed to deposit revenue.
    pub router: Address,
    /// Share of routed revenue, mirroring the Router's setting.
    pub share_bps: u16,
    /// Seconds from creation until the series may be matured.
    pub duration_secs: u64,
    /// Fixed share-token supply.
    pub total_supply: Amount,
    /// Receives the whole supply at creation.
    pub initial_holder: Address,
}

/// Read-only snapshot of a Series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub protocol: Address,
    pub router: Address,
    pub share_bps: BasisPoints,
    pub maturity_timestamp: Timestamp,
    pub maturity: Maturity,
    pub time_until_maturity: u64,
    pub total_supply: Amount,
    pub total_revenue_received: Amount,
    pub total_claimed: Amount,
    pub cumulative_revenue_per_share: U256,
    pub custody: Amount,
}

/// A revenue series: share supply, accrual, and claims.
#[derive(Clone, Debug)]
pub struct Series {
    address: Address,
    name: String,
    symbol: String,
    protocol: Address,
    router: Address,
    share_bps: BasisPoints,
    maturity_timestamp: Timestamp,
    maturity: Maturity,
    accrual: RevenueAccumulator,
    holders: HolderBook,
    total_claimed: Amount,
    custody: Amount,
    events: EventLog,
}

impl Series {
    /// Create a Series at `address`, maturing `duration_secs` after `now`.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::InvalidAddress`] if any configured address is zero
    /// - [`SeriesError::InvalidBasisPoints`] if `share_bps` is outside `1..=10000`
    /// - [`SeriesError::InvalidDuration`] if `duration_secs` is zero
    /// - [`SeriesError::Overflow`] if the maturity timestamp overflows
    pub fn new(address: Address, config: SeriesConfig, now: Timestamp) -> Result<Self> {
        if address.is_zero()
            || config.protocol.is_zero()
            || config.router.is_zero()
            || config.initial_holder.is_zero()
        {
            return Err(SeriesError::InvalidAddress);
        }
        let share_bps = BasisPoints::new(config.share_bps)?;
        if config.duration_secs == 0 {
            return Err(SeriesError::InvalidDuration);
        }
        let maturity_timestamp = now
            .checked_add(config.duration_secs)
            .ok_or(SeriesError::Overflow)?;

        tracing::info!(
            %address,
            router = %config.router,
            %share_bps,
            maturity_timestamp,
            total_supply = %config.total_supply,
            "series: created"
        );

        Ok(Self {
            address,
            name: config.name,
            symbol: config.symbol,
            protocol: config.protocol,
            router: config.router,
            share_bps,
            maturity_timestamp,
            maturity: Maturity::Active,
            accrual: RevenueAccumulator::new(),
            holders: HolderBook::with_initial_supply(config.initial_holder, config.total_supply),
            total_claimed: U256::ZERO,
            custody: U256::ZERO,
            events: EventLog::new(),
        })
    }

    /// Accept revenue from the bound router.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::Unauthorized`] if `caller` is not the router
    /// - [`SeriesError::AlreadyMatured`] if the series has matured
    /// - [`SeriesError::InvalidAmount`] if `amount` is zero
    /// - [`SeriesError::NoShares`] if the share supply is zero
    /// - [`SeriesError::Overflow`] if lifetime revenue no longer fits the accumulator
    pub fn receive_revenue(
        &mut self,
        caller: Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        if caller != self.router {
            return Err(SeriesError::Unauthorized { caller });
        }
        if self.maturity.is_matured() {
            return Err(SeriesError::AlreadyMatured);
        }
        if amount.is_zero() {
            return Err(SeriesError::InvalidAmount);
        }

        let custody = checked_accumulate(self.custody, amount)?;
        let per_share = self.accrual.deposit(amount, self.holders.total_supply())?;
        self.custody = custody;

        tracing::debug!(
            series = %self.address,
            %amount,
            %per_share,
            "series: revenue received"
        );
        self.events.emit(
            self.address,
            now,
            EventKind::SeriesRevenueReceived {
                amount,
                cumulative_per_share: per_share,
            },
        );
        Ok(())
    }

    /// Revenue currently claimable by `holder`.
    pub fn calculate_claimable(&self, holder: &Address) -> Amount {
        self.holders.claimable(holder, &self.accrual)
    }

    /// Pay `caller` everything they can claim.
    ///
    /// The checkpoint is written before value leaves custody and is put back
    /// if the payout is refused.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::NothingToClaim`] if the claimable amount is zero
    /// - [`SeriesError::Payout`] if the transfer to `caller` fails
    pub fn claim_revenue<P: Payout + ?Sized>(
        &mut self,
        caller: Address,
        payout: &mut P,
        now: Timestamp,
    ) -> Result<Amount> {
        let amount = self.calculate_claimable(&caller);
        if amount.is_zero() {
            return Err(SeriesError::NothingToClaim);
        }
        let custody = checked_debit(self.custody, amount)?;
        let total_claimed = checked_accumulate(self.total_claimed, amount)?;

        let previous = self.holders.checkpoint_claim(caller, &self.accrual);
        let prior_custody = self.custody;
        let prior_claimed = self.total_claimed;
        self.custody = custody;
        self.total_claimed = total_claimed;

        if let Err(err) = payout.pay(self.address, caller, amount) {
            self.holders.restore(caller, previous);
            self.custody = prior_custody;
            self.total_claimed = prior_claimed;
            tracing::warn!(series = %self.address, holder = %caller, %err, "series: claim payout failed");
            return Err(err.into());
        }

        tracing::info!(series = %self.address, holder = %caller, %amount, "series: revenue claimed");
        self.events.emit(
            self.address,
            now,
            EventKind::RevenueClaimed {
                holder: caller,
                amount,
            },
        );
        Ok(amount)
    }

    /// Permanently stop accepting revenue. Callable by anyone once the
    /// maturity timestamp has passed.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::AlreadyMatured`] if already matured
    /// - [`SeriesError::NotYetMatured`] if `now` is before the maturity timestamp
    pub fn mature_series(&mut self, caller: Address, now: Timestamp) -> Result<()> {
        self.maturity.mature(self.maturity_timestamp, now)?;

        tracing::info!(
            series = %self.address,
            %caller,
            total_revenue = %self.accrual.total_deposited(),
            "series: matured"
        );
        self.events.emit(self.address, now, EventKind::SeriesMatured);
        Ok(())
    }

    /// Transfer shares, settling both parties' accrual first.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::InvalidAddress`] if `to` is zero
    /// - [`SeriesError::InvalidAmount`] if `amount` is zero
    /// - [`SeriesError::InsufficientShares`] if `from` holds less than `amount`
    pub fn transfer_shares(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        self.holders.transfer(from, to, amount, &self.accrual)?;

        tracing::info!(series = %self.address, %from, %to, %amount, "series: shares transferred");
        self.events.emit(
            self.address,
            now,
            EventKind::SharesTransferred { from, to, amount },
        );
        Ok(())
    }

    /// Burn shares held by `holder`, settling their accrual first.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::InvalidAmount`] if `amount` is zero
    /// - [`SeriesError::InsufficientShares`] if `holder` holds less than `amount`
    pub fn burn_shares(&mut self, holder: Address, amount: Amount, now: Timestamp) -> Result<()> {
        self.holders.burn(holder, amount, &self.accrual)?;

        tracing::info!(series = %self.address, %holder, %amount, "series: shares burned");
        self.events
            .emit(self.address, now, EventKind::SharesBurned { holder, amount });
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn protocol(&self) -> Address {
        self.protocol
    }

    pub fn router(&self) -> Address {
        self.router
    }

    pub fn share_bps(&self) -> BasisPoints {
        self.share_bps
    }

    pub fn maturity(&self) -> Maturity {
        self.maturity
    }

    pub fn is_matured(&self) -> bool {
        self.maturity.is_matured()
    }

    pub fn maturity_timestamp(&self) -> Timestamp {
        self.maturity_timestamp
    }

    /// Seconds left until the series may be matured; zero once reachable.
    pub fn time_until_maturity(&self, now: Timestamp) -> u64 {
        self.maturity_timestamp.saturating_sub(now)
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.holders.balance_of(holder)
    }

    pub fn total_supply(&self) -> Amount {
        self.holders.total_supply()
    }

    pub fn total_revenue_received(&self) -> Amount {
        self.accrual.total_deposited()
    }

    pub fn total_claimed(&self) -> Amount {
        self.total_claimed
    }

    pub fn cumulative_revenue_per_share(&self) -> U256 {
        self.accrual.per_share()
    }

    /// Value held by the series.
    pub fn custody(&self) -> Amount {
        self.custody
    }

    /// Pending events.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take pending events for the host to publish.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    /// Aggregate read-only view.
    pub fn info(&self, now: Timestamp) -> SeriesInfo {
        SeriesInfo {
            address: self.address,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            protocol: self.protocol,
            router: self.router,
            share_bps: self.share_bps,
            maturity_timestamp: self.maturity_timestamp,
            maturity: self.maturity,
            time_until_maturity: self.time_until_maturity(now),
            total_supply: self.total_supply(),
            total_revenue_received: self.total_revenue_received(),
            total_claimed: self.total_claimed,
            cumulative_revenue_per_share: self.accrual.per_share(),
            custody: self.custody,
        }
    }
}

impl RevenueSink for Series {
    type Error = SeriesError;

    fn sink_address(&self) -> Address {
        self.address
    }

    fn receive_revenue(
        &mut self,
        caller: Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        Series::receive_revenue(self, caller, amount, now)
    }
}
