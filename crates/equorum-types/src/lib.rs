//! # equorum-types
//!
//! Shared domain types used across the Equorum workspace: identities,
//! 256-bit amounts, timestamps, and the event envelope every contract emits.

pub mod events;

pub use alloy_primitives::{Address, U256};

/// Native value and share quantities.
pub type Amount = U256;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Basis-point denominator (100%).
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Base amounts per whole unit of native value (10^18).
pub const UNIT: u64 = 1_000_000_000_000_000_000;

/// Fixed-point scale of the cumulative revenue-per-share accumulator.
pub const ACCRUAL_SCALE: U256 = U256::from_limbs([UNIT, 0, 0, 0]);

/// Seconds in one day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// `n` whole units expressed in base amounts.
pub fn units(n: u64) -> Amount {
    U256::from(n) * U256::from(UNIT)
}
