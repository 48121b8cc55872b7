//! Scenario replay.
//!
//! Deploys one Router/Series pair from a [`SimConfig`], binds them, then
//! applies each [`Step`] in order. A failing step is recorded and the replay
//! continues; only a failed deployment aborts.

use equorum_router::{RouteOutcome, RouterConfig, RouterStatus};
use equorum_series::{SeriesConfig, SeriesInfo};
use equorum_types::events::Event;
use equorum_types::{Address, Amount, Timestamp};
use serde::Serialize;

use crate::config::{SimConfig, Step};
use crate::{Chain, Result};

/// Clock value the scenario starts at.
pub const GENESIS: Timestamp = 1_700_000_000;

/// Value a successful step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StepOutput {
    Route(RouteOutcome),
    Amount(Amount),
    Time(Timestamp),
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub step: Step,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<StepOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-account view at the end of the scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReport {
    pub address: Address,
    pub balance: Amount,
    pub shares: Amount,
    pub claimable: Amount,
}

/// Everything the simulator prints.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub router: RouterStatus,
    pub series: SeriesInfo,
    pub steps: Vec<StepReport>,
    pub accounts: Vec<AccountReport>,
    pub events: Vec<Event>,
    /// Router custody conservation held at the end.
    pub conserved: bool,
}

impl ScenarioReport {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|step| !step.succeeded())
    }
}

/// Deployed addresses.
#[derive(Debug, Clone, Copy)]
struct Pair {
    router: Address,
    series: Address,
}

fn deploy(chain: &mut Chain, config: &SimConfig) -> Result<Pair> {
    let d = &config.deployment;
    let router = chain.deploy_router(
        d.deployer,
        RouterConfig {
            protocol: d.protocol,
            owner: d.owner,
            series: None,
            share_bps: d.share_bps,
        },
    )?;
    let series = chain.deploy_series(
        d.deployer,
        SeriesConfig {
            name: d.name.clone(),
            symbol: d.symbol.clone(),
            protocol: d.protocol,
            router,
            share_bps: d.share_bps,
            duration_secs: d.duration_secs,
            total_supply: d.total_supply,
            initial_holder: d.initial_holder(),
        },
    )?;
    chain.update_series_address(d.owner, router, series)?;

    tracing::info!(%router, %series, "scenario: pair deployed");
    Ok(Pair { router, series })
}

fn apply(chain: &mut Chain, pair: Pair, step: &Step) -> Result<Option<StepOutput>> {
    let Pair { router, series } = pair;
    let output = match *step {
        Step::Fund { account, amount } => {
            chain.fund(account, amount)?;
            None
        }
        Step::Send { from, amount } => {
            chain.send_value(from, router, amount)?;
            None
        }
        Step::ReceiveAndRoute { from, amount } => {
            Some(StepOutput::Route(chain.receive_and_route(from, router, amount)?))
        }
        Step::Route => Some(StepOutput::Route(chain.route_revenue(router)?)),
        Step::WithdrawToProtocol { caller, amount } => {
            chain.withdraw_to_protocol(caller, router, amount)?;
            Some(StepOutput::Amount(amount))
        }
        Step::WithdrawAllToProtocol { caller } => Some(StepOutput::Amount(
            chain.withdraw_all_to_protocol(caller, router)?,
        )),
        Step::EmergencyWithdraw { caller, to } => Some(StepOutput::Amount(
            chain.emergency_withdraw(caller, router, to)?,
        )),
        Step::Pause { caller } => {
            chain.pause(caller, router)?;
            None
        }
        Step::Unpause { caller } => {
            chain.unpause(caller, router)?;
            None
        }
        Step::TransferOwnership { caller, new_owner } => {
            chain.transfer_ownership(caller, router, new_owner)?;
            None
        }
        Step::TransferShares { from, to, amount } => {
            chain.transfer_shares(series, from, to, amount)?;
            None
        }
        Step::BurnShares { holder, amount } => {
            chain.burn_shares(series, holder, amount)?;
            None
        }
        Step::Claim { holder } => Some(StepOutput::Amount(chain.claim_revenue(holder, series)?)),
        Step::Mature { caller } => {
            chain.mature_series(caller, series)?;
            None
        }
        Step::AdvanceTime { seconds } => Some(StepOutput::Time(chain.advance_time(seconds)?)),
        Step::SetRefusing { account, refusing } => {
            chain.set_refusing(account, refusing);
            None
        }
    };
    Ok(output)
}

/// Deploy the configured pair and replay every step.
///
/// # Errors
///
/// Returns an error only if deployment fails.
pub fn run_scenario(config: &SimConfig) -> Result<ScenarioReport> {
    let mut chain = Chain::new(GENESIS);
    let pair = deploy(&mut chain, config)?;

    let mut steps = Vec::with_capacity(config.steps.len());
    for (index, step) in config.steps.iter().enumerate() {
        let report = match apply(&mut chain, pair, step) {
            Ok(output) => StepReport {
                index,
                step: step.clone(),
                output,
                error: None,
            },
            Err(err) => {
                tracing::warn!(index, %err, "scenario: step failed");
                StepReport {
                    index,
                    step: step.clone(),
                    output: None,
                    error: Some(err.to_string()),
                }
            }
        };
        steps.push(report);
    }

    let mut accounts = Vec::new();
    for address in config.participants() {
        accounts.push(AccountReport {
            address,
            balance: chain.balance_of(&address),
            shares: chain.share_balance(&pair.series, &address)?,
            claimable: chain.claimable(&pair.series, &address)?,
        });
    }

    let router = chain.router_status(&pair.router)?;
    let conserved = chain.router(&pair.router)?.counters().is_conserved();
    let failed = steps.iter().filter(|step| !step.succeeded()).count();
    tracing::info!(steps = steps.len(), failed, conserved, "scenario: finished");

    Ok(ScenarioReport {
        router,
        series: chain.series_info(&pair.series)?,
        steps,
        accounts,
        events: chain.events().to_vec(),
        conserved,
    })
}
