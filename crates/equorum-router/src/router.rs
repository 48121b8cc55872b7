//! The Router contract.
//!
//! ## Custody conservation
//!
//! ```text
//! total_received == total_routed_to_series + total_returned_to_protocol
//!                 + custody + total_emergency_withdrawn
//! ```
//!
//! Routing always splits the whole current custody, so value retained from
//! an earlier split is split again on the next attempt unless the protocol
//! withdraws it first.

use equorum_ledger::{
    checked_accumulate, checked_debit, split, BasisPoints, Payout, RevenueSink,
};
use equorum_types::events::{Event, EventKind, EventLog};
use equorum_types::{Address, Amount, Timestamp, U256};
use serde::{Deserialize, Serialize};

use crate::access::{require_nonzero, require_owner, require_owner_or_protocol};
use crate::outcome::RouteOutcome;
use crate::pause::PauseSwitch;
use crate::{Result, RouterError};

/// Constructor parameters for a Router.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Protocol payout address.
    pub protocol: Address,
    /// Administrative owner.
    pub owner: Address,
    /// Series to route to, if already known.
    #[serde(default)]
    pub series: Option<Address>,
    /// Share of each routing forwarded to the Series.
    pub share_bps: u16,
}

/// Monotonic accounting counters plus current custody.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub total_received: Amount,
    pub total_routed_to_series: Amount,
    pub total_returned_to_protocol: Amount,
    pub total_emergency_withdrawn: Amount,
    pub failed_route_count: u64,
    /// Value currently held.
    pub custody: Amount,
}

impl Counters {
    /// Whether every unit received is accounted for.
    pub fn is_conserved(&self) -> bool {
        let accounted = self
            .total_routed_to_series
            .checked_add(self.total_returned_to_protocol)
            .and_then(|sum| sum.checked_add(self.custody))
            .and_then(|sum| sum.checked_add(self.total_emergency_withdrawn));
        accounted == Some(self.total_received)
    }
}

/// Read-only aggregate view of a Router.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterStatus {
    pub address: Address,
    pub owner: Address,
    pub protocol: Address,
    pub series: Option<Address>,
    pub share_bps: BasisPoints,
    pub paused: bool,
    pub custody: Amount,
    pub total_received: Amount,
    pub total_routed_to_series: Amount,
    pub total_returned_to_protocol: Amount,
    pub total_emergency_withdrawn: Amount,
    pub failed_route_count: u64,
    /// Custody is non-empty and a Series is bound. Does not predict whether
    /// the Series will accept.
    pub can_route_now: bool,
}

/// Revenue router.
#[derive(Clone, Debug)]
pub struct Router {
    address: Address,
    owner: Address,
    protocol: Address,
    series: Option<Address>,
    share_bps: BasisPoints,
    pause: PauseSwitch,
    counters: Counters,
    events: EventLog,
}

impl Router {
    /// Create a Router at `address`.
    ///
    /// # Errors
    ///
    /// - [`RouterError::InvalidAddress`] if `address`, `protocol` or `owner` is
    ///   zero, or `series` is `Some(zero)`
    /// - [`RouterError::InvalidBasisPoints`] if `share_bps` is outside `1..=10000`
    pub fn new(address: Address, config: RouterConfig) -> Result<Self> {
        require_nonzero(address)?;
        require_nonzero(config.protocol)?;
        require_nonzero(config.owner)?;
        if let Some(series) = config.series {
            require_nonzero(series)?;
        }
        let share_bps = BasisPoints::new(config.share_bps)?;

        tracing::info!(
            %address,
            protocol = %config.protocol,
            %share_bps,
            series_bound = config.series.is_some(),
            "router: created"
        );

        Ok(Self {
            address,
            owner: config.owner,
            protocol: config.protocol,
            series: config.series,
            share_bps,
            pause: PauseSwitch::new(),
            counters: Counters::default(),
            events: EventLog::new(),
        })
    }

    /// Take value into custody. Never paused.
    ///
    /// # Errors
    ///
    /// - [`RouterError::Overflow`] if the lifetime total overflows
    pub fn receive(&mut self, sender: Address, amount: Amount, now: Timestamp) -> Result<()> {
        let total_received = checked_accumulate(self.counters.total_received, amount)?;
        let custody = checked_accumulate(self.counters.custody, amount)?;
        self.counters.total_received = total_received;
        self.counters.custody = custody;

        tracing::info!(router = %self.address, %sender, %amount, "router: revenue received");
        self.events.emit(
            self.address,
            now,
            EventKind::RevenueReceived { sender, amount },
        );
        Ok(())
    }

    /// Take value into custody and route in the same unit of work.
    ///
    /// If routing fails hard, the receipt is undone too.
    ///
    /// # Errors
    ///
    /// - [`RouterError::Paused`] if paused
    /// - any error of [`Router::receive`] or [`Router::route_revenue`]
    pub fn receive_and_route<S: RevenueSink + ?Sized>(
        &mut self,
        sender: Address,
        amount: Amount,
        series: &mut S,
        now: Timestamp,
    ) -> Result<RouteOutcome> {
        self.pause.check_operational()?;
        self.require_bound(series.sink_address())?;

        let counters = self.counters;
        let mark = self.events.len();
        self.receive(sender, amount, now)?;
        match self.route_bound(series, now) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.counters = counters;
                self.events.truncate(mark);
                Err(err)
            }
        }
    }

    /// Split custody and forward the Series' share. Permissionless.
    ///
    /// A refusal by the Series is not an error: it is counted, recorded, and
    /// returned as [`RouteOutcome::Rejected`] with custody untouched.
    ///
    /// # Errors
    ///
    /// - [`RouterError::Paused`] if paused
    /// - [`RouterError::SeriesNotSet`] if no Series is bound
    /// - [`RouterError::SeriesMismatch`] if `series` is not the bound Series
    /// - [`RouterError::NoBalance`] if custody is empty
    pub fn route_revenue<S: RevenueSink + ?Sized>(
        &mut self,
        series: &mut S,
        now: Timestamp,
    ) -> Result<RouteOutcome> {
        self.pause.check_operational()?;
        self.require_bound(series.sink_address())?;
        self.route_bound(series, now)
    }

    fn route_bound<S: RevenueSink + ?Sized>(
        &mut self,
        series: &mut S,
        now: Timestamp,
    ) -> Result<RouteOutcome> {
        let custody = self.counters.custody;
        if custody.is_zero() {
            return Err(RouterError::NoBalance);
        }
        let parts = split(custody, self.share_bps);
        let total_routed = checked_accumulate(self.counters.total_routed_to_series, parts.to_series)?;

        match series.receive_revenue(self.address, parts.to_series, now) {
            Ok(()) => {
                self.counters.custody = parts.remainder;
                self.counters.total_routed_to_series = total_routed;

                tracing::info!(
                    router = %self.address,
                    to_series = %parts.to_series,
                    retained = %parts.remainder,
                    "router: revenue routed"
                );
                self.events.emit(
                    self.address,
                    now,
                    EventKind::RevenueRouted {
                        to_series: parts.to_series,
                        remainder: parts.remainder,
                    },
                );
                Ok(RouteOutcome::Routed {
                    to_series: parts.to_series,
                    retained: parts.remainder,
                })
            }
            Err(err) => {
                let reason = err.to_string();
                let failed_route_count = self.counters.failed_route_count.saturating_add(1);
                self.counters.failed_route_count = failed_route_count;

                tracing::warn!(
                    router = %self.address,
                    attempted = %parts.to_series,
                    failed_route_count,
                    %reason,
                    "router: series rejected revenue, funds kept in custody"
                );
                self.events.emit(
                    self.address,
                    now,
                    EventKind::RouteAttemptFailed {
                        attempted: parts.to_series,
                        reason: reason.clone(),
                    },
                );
                Ok(RouteOutcome::Rejected {
                    attempted: parts.to_series,
                    reason,
                })
            }
        }
    }

    /// Pay `amount` of custody to the protocol. Never paused.
    ///
    /// # Errors
    ///
    /// - [`RouterError::Unauthorized`] unless `caller` is the protocol or owner
    /// - [`RouterError::InvalidAmount`] if `amount` is zero
    /// - [`RouterError::InsufficientBalance`] if `amount` exceeds custody
    /// - [`RouterError::Payout`] if the protocol refuses the transfer
    pub fn withdraw_to_protocol<P: Payout + ?Sized>(
        &mut self,
        caller: Address,
        amount: Amount,
        payout: &mut P,
        now: Timestamp,
    ) -> Result<()> {
        require_owner_or_protocol(caller, self.owner, self.protocol)?;
        if amount.is_zero() {
            return Err(RouterError::InvalidAmount);
        }
        self.pay_protocol(amount, payout, now)
    }

    /// Pay all custody to the protocol. Never paused.
    ///
    /// # Errors
    ///
    /// - [`RouterError::Unauthorized`] unless `caller` is the protocol or owner
    /// - [`RouterError::NoBalance`] if custody is empty
    /// - [`RouterError::Payout`] if the protocol refuses the transfer
    pub fn withdraw_all_to_protocol<P: Payout + ?Sized>(
        &mut self,
        caller: Address,
        payout: &mut P,
        now: Timestamp,
    ) -> Result<Amount> {
        require_owner_or_protocol(caller, self.owner, self.protocol)?;
        let amount = self.counters.custody;
        if amount.is_zero() {
            return Err(RouterError::NoBalance);
        }
        self.pay_protocol(amount, payout, now)?;
        Ok(amount)
    }

    fn pay_protocol<P: Payout + ?Sized>(
        &mut self,
        amount: Amount,
        payout: &mut P,
        now: Timestamp,
    ) -> Result<()> {
        let custody = checked_debit(self.counters.custody, amount)?;
        let returned = checked_accumulate(self.counters.total_returned_to_protocol, amount)?;

        let before = self.counters;
        self.counters.custody = custody;
        self.counters.total_returned_to_protocol = returned;

        if let Err(err) = payout.pay(self.address, self.protocol, amount) {
            self.counters = before;
            tracing::warn!(router = %self.address, %amount, %err, "router: protocol withdrawal failed");
            return Err(err.into());
        }

        tracing::info!(router = %self.address, %amount, "router: withdrawn to protocol");
        self.events.emit(
            self.address,
            now,
            EventKind::ProtocolWithdrawal {
                to: self.protocol,
                amount,
            },
        );
        Ok(())
    }

    /// Sweep all custody to `to`, bypassing the routed/returned counters.
    ///
    /// # Errors
    ///
    /// - [`RouterError::Unauthorized`] unless `caller` is the owner
    /// - [`RouterError::InvalidAddress`] if `to` is zero
    /// - [`RouterError::NoBalance`] if custody is empty
    /// - [`RouterError::Payout`] if `to` refuses the transfer
    pub fn emergency_withdraw<P: Payout + ?Sized>(
        &mut self,
        caller: Address,
        to: Address,
        payout: &mut P,
        now: Timestamp,
    ) -> Result<Amount> {
        require_owner(caller, self.owner)?;
        require_nonzero(to)?;
        let amount = self.counters.custody;
        if amount.is_zero() {
            return Err(RouterError::NoBalance);
        }
        let swept = checked_accumulate(self.counters.total_emergency_withdrawn, amount)?;

        let before = self.counters;
        self.counters.custody = U256::ZERO;
        self.counters.total_emergency_withdrawn = swept;

        if let Err(err) = payout.pay(self.address, to, amount) {
            self.counters = before;
            tracing::warn!(router = %self.address, %to, %err, "router: emergency withdraw failed");
            return Err(err.into());
        }

        tracing::warn!(router = %self.address, %to, %amount, "router: emergency withdraw");
        self.events
            .emit(self.address, now, EventKind::EmergencyWithdraw { to, amount });
        Ok(amount)
    }

    /// Bind the Series. Allowed exactly once.
    ///
    /// # Errors
    ///
    /// - [`RouterError::Unauthorized`] unless `caller` is the owner or protocol
    /// - [`RouterError::AlreadySet`] if a Series is already bound
    /// - [`RouterError::InvalidAddress`] if `series` is zero
    pub fn update_series_address(
        &mut self,
        caller: Address,
        series: Address,
        now: Timestamp,
    ) -> Result<()> {
        require_owner_or_protocol(caller, self.owner, self.protocol)?;
        if self.series.is_some() {
            return Err(RouterError::AlreadySet);
        }
        require_nonzero(series)?;

        self.series = Some(series);
        tracing::info!(router = %self.address, %series, "router: series bound");
        self.events
            .emit(self.address, now, EventKind::SeriesAddressUpdated { series });
        Ok(())
    }

    /// # Errors
    ///
    /// - [`RouterError::Unauthorized`] unless `caller` is the owner
    /// - [`RouterError::AlreadyPaused`] if already paused
    pub fn pause(&mut self, caller: Address, now: Timestamp) -> Result<()> {
        require_owner(caller, self.owner)?;
        self.pause.pause(now)?;
        tracing::warn!(router = %self.address, by = %caller, "router: routing paused");
        self.events
            .emit(self.address, now, EventKind::RouterPaused { by: caller });
        Ok(())
    }

    /// # Errors
    ///
    /// - [`RouterError::Unauthorized`] unless `caller` is the owner
    /// - [`RouterError::NotPaused`] if not paused
    pub fn unpause(&mut self, caller: Address, now: Timestamp) -> Result<()> {
        require_owner(caller, self.owner)?;
        self.pause.resume(now)?;
        tracing::info!(router = %self.address, by = %caller, "router: routing resumed");
        self.events
            .emit(self.address, now, EventKind::RouterUnpaused { by: caller });
        Ok(())
    }

    /// Hand administrative control to `new_owner`.
    ///
    /// # Errors
    ///
    /// - [`RouterError::Unauthorized`] unless `caller` is the owner
    /// - [`RouterError::InvalidAddress`] if `new_owner` is zero
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
        now: Timestamp,
    ) -> Result<()> {
        require_owner(caller, self.owner)?;
        require_nonzero(new_owner)?;

        let previous = self.owner;
        self.owner = new_owner;
        tracing::info!(router = %self.address, %previous, %new_owner, "router: ownership transferred");
        self.events.emit(
            self.address,
            now,
            EventKind::OwnershipTransferred {
                previous,
                new_owner,
            },
        );
        Ok(())
    }

    fn require_bound(&self, given: Address) -> Result<()> {
        match self.series {
            None => Err(RouterError::SeriesNotSet),
            Some(bound) if bound != given => Err(RouterError::SeriesMismatch { bound, given }),
            Some(_) => Ok(()),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn protocol(&self) -> Address {
        self.protocol
    }

    pub fn series(&self) -> Option<Address> {
        self.series
    }

    pub fn share_bps(&self) -> BasisPoints {
        self.share_bps
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn custody(&self) -> Amount {
        self.counters.custody
    }

    pub fn counters(&self) -> Counters {
        self.counters
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
    pub fn status(&self) -> RouterStatus {
        let c = self.counters;
        RouterStatus {
            address: self.address,
            owner: self.owner,
            protocol: self.protocol,
            series: self.series,
            share_bps: self.share_bps,
            paused: self.pause.is_paused(),
            custody: c.custody,
            total_received: c.total_received,
            total_routed_to_series: c.total_routed_to_series,
            total_returned_to_protocol: c.total_returned_to_protocol,
            total_emergency_withdrawn: c.total_emergency_withdrawn,
            failed_route_count: c.failed_route_count,
            can_route_now: !c.custody.is_zero() && self.series.is_some(),
        }
    }
}
