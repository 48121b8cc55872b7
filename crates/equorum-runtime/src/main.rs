//! equorum-sim: replays a revenue scenario against an in-process chain.
//!
//! Usage: `equorum-sim [config.toml]`. Without an argument the config path is
//! read from `$EQUORUM_CONFIG`; without either, the built-in scenario runs.
//! The final report is printed to stdout as JSON; logs go to stderr.

use equorum_runtime::{run_scenario, SimConfig};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    // Config first: it carries the log level.
    let config = SimConfig::load(std::env::args().nth(1))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("equorum={}", config.logging.log_level).parse()?),
        )
        .init();

    info!(
        steps = config.steps.len(),
        share_bps = config.deployment.share_bps,
        "equorum-sim starting"
    );

    let report = run_scenario(&config)?;
    for step in report.failed_steps() {
        warn!(
            index = step.index,
            error = step.error.as_deref().unwrap_or_default(),
            "step failed"
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.conserved {
        anyhow::bail!("router custody is not conserved");
    }
    Ok(())
}
