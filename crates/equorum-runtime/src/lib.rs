//! # equorum-runtime
//!
//! Execution environment for Router and Series contracts.
//!
//! [`Chain`] owns every deployed contract, a native-value bank for plain
//! accounts and a clock. Each call is an atomic unit of work: the world is
//! checkpointed first and restored if the call fails, so a failed call leaves
//! no trace, including pending events.
//!
//! ## Modules
//!
//! - [`chain`]: Contract host with whole-world rollback
//! - [`config`]: TOML configuration for the simulator
//! - [`scenario`]: Replays a configured step list against a [`Chain`]

pub mod chain;
pub mod config;
pub mod scenario;

use equorum_ledger::LedgerError;
use equorum_router::RouterError;
use equorum_series::SeriesError;
use equorum_types::{Address, Timestamp};

pub use chain::Chain;
pub use config::SimConfig;
pub use scenario::{run_scenario, ScenarioReport, StepReport};

/// Error types for calls dispatched through a [`Chain`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// No Router is deployed at the address.
    #[error("no router deployed at {0}")]
    UnknownRouter(Address),

    /// No Series is deployed at the address.
    #[error("no series deployed at {0}")]
    UnknownSeries(Address),

    /// The target is a contract without a plain receive path.
    #[error("{0} does not accept plain value transfers")]
    NotPayable(Address),

    /// Advancing the clock would overflow.
    #[error("clock overflow: now {now}, advance {seconds}")]
    ClockOverflow {
        /// Current time.
        now: Timestamp,
        /// Requested advance.
        seconds: u64,
    },
}

/// Convenience result type for chain calls.
pub type Result<T> = std::result::Result<T, ChainError>;
