//! Simulator configuration.
//!
//! ```toml
//! [logging]
//! log_level = "debug"
//!
//! [deployment]
//! share_bps = 2000
//! total_supply = "1000000"
//!
//! [[steps]]
//! action = "receive_and_route"
//! from = "0x5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d"
//! amount = "1.5"
//! ```
//!
//! Amounts are decimal strings in whole units.

use std::path::{Path, PathBuf};

use equorum_types::{Address, Amount, SECONDS_PER_DAY};
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "EQUORUM_CONFIG";

/// Errors loading a [`SimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub deployment: DeploymentConfig,
    /// Calls to replay, in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for `equorum*` targets: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// The Router/Series pair the scenario runs against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default = "default_deployer")]
    pub deployer: Address,
    #[serde(default = "default_owner")]
    pub owner: Address,
    #[serde(default = "default_protocol")]
    pub protocol: Address,
    /// Receives the whole share supply. Defaults to the protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_holder: Option<Address>,
    #[serde(default = "default_share_bps")]
    pub share_bps: u16,
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    #[serde(default = "default_total_supply", with = "decimal_units")]
    pub total_supply: Amount,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

/// One call against the deployed pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Mint native value to a plain account.
    Fund {
        account: Address,
        #[serde(with = "decimal_units")]
        amount: Amount,
    },
    /// Plain transfer into the Router, no routing.
    Send {
        from: Address,
        #[serde(with = "decimal_units")]
        amount: Amount,
    },
    ReceiveAndRoute {
        from: Address,
        #[serde(with = "decimal_units")]
        amount: Amount,
    },
    Route,
    WithdrawToProtocol {
        caller: Address,
        #[serde(with = "decimal_units")]
        amount: Amount,
    },
    WithdrawAllToProtocol {
        caller: Address,
    },
    EmergencyWithdraw {
        caller: Address,
        to: Address,
    },
    Pause {
        caller: Address,
    },
    Unpause {
        caller: Address,
    },
    TransferOwnership {
        caller: Address,
        new_owner: Address,
    },
    TransferShares {
        from: Address,
        to: Address,
        #[serde(with = "decimal_units")]
        amount: Amount,
    },
    BurnShares {
        holder: Address,
        #[serde(with = "decimal_units")]
        amount: Amount,
    },
    Claim {
        holder: Address,
    },
    Mature {
        caller: Address,
    },
    AdvanceTime {
        seconds: u64,
    },
    SetRefusing {
        account: Address,
        refusing: bool,
    },
}

impl Step {
    /// Accounts this step names.
    pub fn participants(&self) -> Vec<Address> {
        match self {
            Step::Fund { account, .. } | Step::SetRefusing { account, .. } => vec![*account],
            Step::Send { from, .. } | Step::ReceiveAndRoute { from, .. } => vec![*from],
            Step::WithdrawToProtocol { caller, .. }
            | Step::WithdrawAllToProtocol { caller }
            | Step::Pause { caller }
            | Step::Unpause { caller }
            | Step::Mature { caller } => vec![*caller],
            Step::EmergencyWithdraw { caller, to } => vec![*caller, *to],
            Step::TransferOwnership { caller, new_owner } => vec![*caller, *new_owner],
            Step::TransferShares { from, to, .. } => vec![*from, *to],
            Step::BurnShares { holder, .. } | Step::Claim { holder } => vec![*holder],
            Step::Route | Step::AdvanceTime { .. } => Vec::new(),
        }
    }
}

/// Decimal whole-unit strings (`"1.5"`) to and from base amounts.
mod decimal_units {
    use alloy_primitives::utils::{format_ether, parse_ether};
    use equorum_types::Amount;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_ether(*amount))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse_ether(&value).map_err(|e| D::Error::custom(format!("invalid amount {value:?}: {e}")))
    }
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_deployer() -> Address {
    Address::repeat_byte(0xD0)
}

fn default_owner() -> Address {
    Address::repeat_byte(0x0A)
}

fn default_protocol() -> Address {
    Address::repeat_byte(0x9F)
}

fn default_payer() -> Address {
    Address::repeat_byte(0x5D)
}

fn default_holder() -> Address {
    Address::repeat_byte(0xB1)
}

fn default_share_bps() -> u16 {
    2_000
}

fn default_duration_secs() -> u64 {
    30 * SECONDS_PER_DAY
}

fn default_total_supply() -> Amount {
    equorum_types::units(1_000_000)
}

fn default_name() -> String {
    "Equorum Revenue Series".to_string()
}

fn default_symbol() -> String {
    "EQRS".to_string()
}

/// One unit received at 2000 bps, a 10% holder claims once and then again.
fn default_steps() -> Vec<Step> {
    let protocol = default_protocol();
    let payer = default_payer();
    let holder = default_holder();
    vec![
        Step::Fund {
            account: payer,
            amount: equorum_types::units(1),
        },
        Step::TransferShares {
            from: protocol,
            to: holder,
            amount: equorum_types::units(100_000),
        },
        Step::Send {
            from: payer,
            amount: equorum_types::units(1),
        },
        Step::Route,
        Step::Claim { holder },
        Step::Claim { holder },
    ]
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            deployment: DeploymentConfig::default(),
            steps: default_steps(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            deployer: default_deployer(),
            owner: default_owner(),
            protocol: default_protocol(),
            initial_holder: None,
            share_bps: default_share_bps(),
            duration_secs: default_duration_secs(),
            total_supply: default_total_supply(),
            name: default_name(),
            symbol: default_symbol(),
        }
    }
}

impl DeploymentConfig {
    pub fn initial_holder(&self) -> Address {
        self.initial_holder.unwrap_or(self.protocol)
    }
}

impl SimConfig {
    /// Load from `arg`, else `$EQUORUM_CONFIG`, else built-in defaults.
    pub fn load(arg: Option<String>) -> Result<Self, ConfigError> {
        match Self::config_path(arg) {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn config_path(arg: Option<String>) -> Option<PathBuf> {
        arg.or_else(|| std::env::var(CONFIG_ENV).ok())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    }

    /// Every account the deployment and steps name, deduplicated.
    pub fn participants(&self) -> Vec<Address> {
        let d = &self.deployment;
        let mut all = vec![d.owner, d.protocol, d.initial_holder()];
        all.extend(self.steps.iter().flat_map(Step::participants));
        all.sort();
        all.dedup();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equorum_types::{units, U256};

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.logging.log_level, "info");
        assert_eq!(config.deployment.share_bps, 2_000);
        assert_eq!(config.deployment.total_supply, units(1_000_000));
        assert_eq!(config.deployment.initial_holder(), config.deployment.protocol);
        assert_eq!(config.steps.len(), 6);
    }

    #[test]
    fn test_config_serialization() {
        let config = SimConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed = SimConfig::from_toml(&toml_str).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_sections_default_independently() {
        let config = SimConfig::from_toml(
            r#"
            [deployment]
            share_bps = 5000
            total_supply = "250.5"
            "#,
        )
        .expect("parse");
        assert_eq!(config.logging.log_level, "info");
        assert_eq!(config.deployment.share_bps, 5_000);
        assert_eq!(
            config.deployment.total_supply,
            units(250) + U256::from(500_000_000_000_000_000u64)
        );
        assert_eq!(config.deployment.symbol, "EQRS");
        assert!(config.steps.is_empty());
    }

    #[test]
    fn test_parse_steps() {
        let config = SimConfig::from_toml(
            r#"
            [[steps]]
            action = "receive_and_route"
            from = "0x5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d"
            amount = "1.5"

            [[steps]]
            action = "route"

            [[steps]]
            action = "advance_time"
            seconds = 86400
            "#,
        )
        .expect("parse");
        assert_eq!(
            config.steps,
            vec![
                Step::ReceiveAndRoute {
                    from: Address::repeat_byte(0x5D),
                    amount: units(1) + U256::from(500_000_000_000_000_000u64),
                },
                Step::Route,
                Step::AdvanceTime { seconds: 86_400 },
            ]
        );
    }

    #[test]
    fn test_invalid_amount_is_rejected() {
        let result = SimConfig::from_toml(
            r#"
            [[steps]]
            action = "send"
            from = "0x5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d5d"
            amount = "ten"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_explicit_path_wins() {
        assert_eq!(
            SimConfig::config_path(Some("sim.toml".to_string())),
            Some(PathBuf::from("sim.toml"))
        );
    }

    #[test]
    fn test_missing_file() {
        let result = SimConfig::from_path(Path::new("/nonexistent/equorum/sim.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_participants_are_deduplicated() {
        let config = SimConfig::default();
        let participants = config.participants();
        assert_eq!(participants.len(), 4);
        assert!(participants.contains(&Address::repeat_byte(0xB1)));
        assert!(participants.contains(&Address::repeat_byte(0x5D)));
    }
}
