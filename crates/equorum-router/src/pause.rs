//! Pause switch for the routing entry points.
//!
//! Only `receive_and_route` and `route_revenue` consult this switch. Passive
//! receipt, protocol withdrawals, the emergency sweep and every Series
//! operation run regardless of it.

use equorum_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{Result, RouterError};

/// Owner-controlled pause state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseSwitch {
    paused: bool,
    /// Time of the last pause or unpause.
    last_changed: Option<Timestamp>,
}

impl PauseSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// - [`RouterError::Paused`] if paused
    pub fn check_operational(&self) -> Result<()> {
        if self.paused {
            return Err(RouterError::Paused);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// - [`RouterError::AlreadyPaused`] if already paused
    pub fn pause(&mut self, now: Timestamp) -> Result<()> {
        if self.paused {
            return Err(RouterError::AlreadyPaused);
        }
        self.paused = true;
        self.last_changed = Some(now);
        Ok(())
    }

    /// # Errors
    ///
    /// - [`RouterError::NotPaused`] if not paused
    pub fn resume(&mut self, now: Timestamp) -> Result<()> {
        if !self.paused {
            return Err(RouterError::NotPaused);
        }
        self.paused = false;
        self.last_changed = Some(now);
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn last_changed(&self) -> Option<Timestamp> {
        self.last_changed
    }
}
