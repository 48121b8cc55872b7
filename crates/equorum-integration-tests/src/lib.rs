//! Integration tests for the Equorum revenue ledger.
//!
//! The tests in `tests/` drive Router and Series together through an
//! in-process [`Chain`], the same way the simulator does. This library only
//! holds the shared deployment fixture.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p equorum-integration-tests
//! ```

use equorum_router::RouterConfig;
use equorum_runtime::{Chain, ChainError};
use equorum_series::SeriesConfig;
use equorum_types::{units, Address, Amount, Timestamp, SECONDS_PER_DAY};

/// Base timestamp for test scenarios.
pub const BASE_TIME: Timestamp = 1_700_000_000;

/// Series lifetime used by the fixture.
pub const DURATION: u64 = 30 * SECONDS_PER_DAY;

pub const DEPLOYER: Address = Address::repeat_byte(0xD0);
pub const OWNER: Address = Address::repeat_byte(0x0A);
pub const PROTOCOL: Address = Address::repeat_byte(0x9F);
pub const PAYER: Address = Address::repeat_byte(0x5D);
pub const HOLDER: Address = Address::repeat_byte(0xB1);
pub const BUYER: Address = Address::repeat_byte(0xB2);

/// A bound Router/Series pair on a fresh chain.
pub struct Deployment {
    pub chain: Chain,
    pub router: Address,
    pub series: Address,
}

impl Deployment {
    /// Deploy and bind a pair whose whole share supply starts with the
    /// protocol, and give [`PAYER`] `funds` units to spend.
    pub fn new(share_bps: u16, total_supply: Amount, funds: u64) -> Result<Self, ChainError> {
        let mut chain = Chain::new(BASE_TIME);
        let router = chain.deploy_router(
            DEPLOYER,
            RouterConfig {
                protocol: PROTOCOL,
                owner: OWNER,
                series: None,
                share_bps,
            },
        )?;
        let series = chain.deploy_series(
            DEPLOYER,
            SeriesConfig {
                name: "Integration Series".to_string(),
                symbol: "ITS".to_string(),
                protocol: PROTOCOL,
                router,
                share_bps,
                duration_secs: DURATION,
                total_supply,
                initial_holder: PROTOCOL,
            },
        )?;
        chain.update_series_address(PROTOCOL, router, series)?;
        chain.fund(PAYER, units(funds))?;
        Ok(Self {
            chain,
            router,
            series,
        })
    }

    /// 2000 bps, one million whole shares.
    pub fn standard() -> Result<Self, ChainError> {
        Self::new(2_000, units(1_000_000), 1_000)
    }

    /// Move `shares` whole shares from the protocol to `holder`.
    pub fn allot(&mut self, holder: Address, shares: u64) -> Result<(), ChainError> {
        self.chain
            .transfer_shares(self.series, PROTOCOL, holder, units(shares))
    }
}
