//! Event records emitted by the Router and the Series.
//!
//! Every state-changing success appends one [`Event`] to the emitting
//! contract's [`EventLog`]. Failed calls never leave events behind: contracts
//! emit only after all checks and effects have succeeded, and the runtime
//! discards pending events when it rolls a call back.
//!
//! Each event is stamped with a process-wide sequence number at emit time, so
//! the host can merge the logs of several contracts back into emission order.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, Timestamp, U256};

/// Envelope for every emitted event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Position in emission order across every contract.
    pub sequence: u64,
    /// Address of the contract that emitted the event.
    pub emitter: Address,
    /// Unix timestamp of the unit of work that produced it.
    pub timestamp: Timestamp,
    /// Type-specific payload.
    pub kind: EventKind,
}

/// All event payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // Router events
    RevenueReceived {
        sender: Address,
        amount: Amount,
    },
    RevenueRouted {
        to_series: Amount,
        remainder: Amount,
    },
    RouteAttemptFailed {
        attempted: Amount,
        reason: String,
    },
    ProtocolWithdrawal {
        to: Address,
        amount: Amount,
    },
    EmergencyWithdraw {
        to: Address,
        amount: Amount,
    },
    SeriesAddressUpdated {
        series: Address,
    },
    RouterPaused {
        by: Address,
    },
    RouterUnpaused {
        by: Address,
    },
    OwnershipTransferred {
        previous: Address,
        new_owner: Address,
    },

    // Series events
    SeriesRevenueReceived {
        amount: Amount,
        cumulative_per_share: U256,
    },
    RevenueClaimed {
        holder: Address,
        amount: Amount,
    },
    SeriesMatured,
    SharesTransferred {
        from: Address,
        to: Address,
        amount: Amount,
    },
    SharesBurned {
        holder: Address,
        amount: Amount,
    },
}

/// Coarse grouping used by downstream consumers such as a reputation
/// registry that only scores routing and claim outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Routing,
    Claims,
    Admin,
}

impl EventKind {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RevenueReceived { .. } => "RevenueReceived",
            Self::RevenueRouted { .. } => "RevenueRouted",
            Self::RouteAttemptFailed { .. } => "RouteAttemptFailed",
            Self::ProtocolWithdrawal { .. } => "ProtocolWithdrawal",
            Self::EmergencyWithdraw { .. } => "EmergencyWithdraw",
            Self::SeriesAddressUpdated { .. } => "SeriesAddressUpdated",
            Self::RouterPaused { .. } => "RouterPaused",
            Self::RouterUnpaused { .. } => "RouterUnpaused",
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
            Self::SeriesRevenueReceived { .. } => "SeriesRevenueReceived",
            Self::RevenueClaimed { .. } => "RevenueClaimed",
            Self::SeriesMatured => "SeriesMatured",
            Self::SharesTransferred { .. } => "SharesTransferred",
            Self::SharesBurned { .. } => "SharesBurned",
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            Self::RevenueReceived { .. }
            | Self::RevenueRouted { .. }
            | Self::RouteAttemptFailed { .. }
            | Self::ProtocolWithdrawal { .. }
            | Self::SeriesRevenueReceived { .. } => EventCategory::Routing,
            Self::RevenueClaimed { .. }
            | Self::SharesTransferred { .. }
            | Self::SharesBurned { .. } => EventCategory::Claims,
            Self::EmergencyWithdraw { .. }
            | Self::SeriesAddressUpdated { .. }
            | Self::RouterPaused { .. }
            | Self::RouterUnpaused { .. }
            | Self::OwnershipTransferred { .. }
            | Self::SeriesMatured => EventCategory::Admin,
        }
    }
}

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Append-only buffer of events pending collection by the host.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    pending: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn emit(&mut self, emitter: Address, timestamp: Timestamp, kind: EventKind) {
        self.pending.push(Event {
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            emitter,
            timestamp,
            kind,
        });
    }

    /// Take every pending event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending)
    }

    /// Drop events emitted after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.pending.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The most recently emitted event, if any.
    pub fn last(&self) -> Option<&Event> {
        self.pending.last()
    }
}
