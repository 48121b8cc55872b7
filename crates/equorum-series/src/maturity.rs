//! One-way maturity state.
//!
//! A Series starts `Active` and can move to `Matured` exactly once, at or
//! after its maturity timestamp. There is no transition back.

use equorum_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{Result, SeriesError};

/// Lifecycle state of a Series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Maturity {
    /// Accepting revenue.
    #[default]
    Active,
    /// No longer accepting revenue; claims continue.
    Matured {
        /// When maturity was triggered.
        at: Timestamp,
    },
}

impl Maturity {
    pub fn is_matured(&self) -> bool {
        matches!(self, Maturity::Matured { .. })
    }

    /// When maturity was triggered, if it has been.
    pub fn matured_at(&self) -> Option<Timestamp> {
        match self {
            Maturity::Active => None,
            Maturity::Matured { at } => Some(*at),
        }
    }

    /// Transition `Active -> Matured`.
    ///
    /// # Errors
    ///
    /// - [`SeriesError::AlreadyMatured`] if already matured
    /// - [`SeriesError::NotYetMatured`] if `current_time < maturity_timestamp`
    pub fn mature(&mut self, maturity_timestamp: Timestamp, current_time: Timestamp) -> Result<()> {
        match self {
            Maturity::Matured { .. } => Err(SeriesError::AlreadyMatured),
            Maturity::Active if current_time < maturity_timestamp => {
                Err(SeriesError::NotYetMatured {
                    maturity_timestamp,
                    current_time,
                })
            }
            Maturity::Active => {
                *self = Maturity::Matured { at: current_time };
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_active() {
        let state = Maturity::default();
        assert!(!state.is_matured());
        assert_eq!(state.matured_at(), None);
    }

    #[test]
    fn test_mature_before_timestamp() {
        let mut state = Maturity::Active;
        assert_eq!(
            state.mature(2_000, 1_999),
            Err(SeriesError::NotYetMatured {
                maturity_timestamp: 2_000,
                current_time: 1_999,
            })
        );
        assert_eq!(state, Maturity::Active);
    }

    #[test]
    fn test_mature_at_timestamp() {
        let mut state = Maturity::Active;
        state.mature(2_000, 2_000).expect("mature");
        assert_eq!(state, Maturity::Matured { at: 2_000 });
    }

    #[test]
    fn test_mature_twice() {
        let mut state = Maturity::Active;
        state.mature(2_000, 2_500).expect("mature");
        assert_eq!(state.mature(2_000, 3_000), Err(SeriesError::AlreadyMatured));
        assert_eq!(state.matured_at(), Some(2_500));
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&Maturity::Matured { at: 7 }).expect("serialize");
        assert_eq!(json, r#"{"state":"matured","at":7}"#);
    }
}
