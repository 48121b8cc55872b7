//! Router-to-Series deposit boundary.
//!
//! The Router forwards revenue through this trait and converts any error into
//! a recorded routing outcome instead of propagating it.

use equorum_types::{Address, Amount, Timestamp};

/// A contract that accepts routed revenue.
pub trait RevenueSink {
    /// Rejection reason reported back to the router.
    type Error: std::error::Error;

    /// Address the sink is deployed at.
    fn sink_address(&self) -> Address;

    /// Accept `amount` from `caller` into custody.
    ///
    /// Implementations must leave their state unchanged when returning an
    /// error.
    fn receive_revenue(
        &mut self,
        caller: Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), Self::Error>;
}
