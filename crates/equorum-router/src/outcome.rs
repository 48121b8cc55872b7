//! Typed result of a routing attempt.

use equorum_types::{Amount, U256};
use serde::{Deserialize, Serialize};

/// What happened when the Router tried to forward revenue.
///
/// A rejection is a successful call: the attempt is recorded and custody is
/// left untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// The Series accepted its share.
    Routed {
        /// Amount forwarded to the Series.
        to_series: Amount,
        /// Amount left in Router custody.
        retained: Amount,
    },
    /// The Series refused the deposit.
    Rejected {
        /// Amount the Router tried to forward.
        attempted: Amount,
        /// The Series' reason.
        reason: String,
    },
}

impl RouteOutcome {
    pub fn is_routed(&self) -> bool {
        matches!(self, RouteOutcome::Routed { .. })
    }

    /// Amount that actually left custody.
    pub fn routed_amount(&self) -> Amount {
        match self {
            RouteOutcome::Routed { to_series, .. } => *to_series,
            RouteOutcome::Rejected { .. } => U256::ZERO,
        }
    }
}
