//! Contract host.
//!
//! Value held by plain accounts lives in the [`Accounts`] bank; value held by
//! contracts lives in their own custody counters. Every public call is one
//! unit of work: if it returns an error the whole world is restored.

use std::collections::BTreeMap;

use equorum_ledger::{Accounts, RevenueSink};
use equorum_router::{RouteOutcome, Router, RouterConfig, RouterStatus};
use equorum_series::{Series, SeriesConfig, SeriesInfo};
use equorum_types::events::{Event, EventCategory};
use equorum_types::{Address, Amount, Timestamp};

use crate::{ChainError, Result};

/// Everything a call can touch.
#[derive(Clone, Debug, Default)]
struct World {
    now: Timestamp,
    bank: Accounts,
    routers: BTreeMap<Address, Router>,
    series: BTreeMap<Address, Series>,
    nonces: BTreeMap<Address, u64>,
}

impl World {
    fn next_address(&mut self, deployer: Address) -> Address {
        let nonce = self.nonces.entry(deployer).or_default();
        let address = deployer.create(*nonce);
        *nonce += 1;
        address
    }

    fn router_mut(&mut self, address: Address) -> Result<&mut Router> {
        self.routers
            .get_mut(&address)
            .ok_or(ChainError::UnknownRouter(address))
    }

    fn series_mut(&mut self, address: Address) -> Result<&mut Series> {
        self.series
            .get_mut(&address)
            .ok_or(ChainError::UnknownSeries(address))
    }
}

/// The Series a Router forwards to, or the empty address it is bound to.
enum Target<'a> {
    Deployed(&'a mut Series),
    Missing(Address),
}

impl RevenueSink for Target<'_> {
    type Error = ChainError;

    fn sink_address(&self) -> Address {
        match self {
            Target::Deployed(series) => series.address(),
            Target::Missing(address) => *address,
        }
    }

    fn receive_revenue(&mut self, caller: Address, amount: Amount, now: Timestamp) -> Result<()> {
        match self {
            Target::Deployed(series) => Ok(series.receive_revenue(caller, amount, now)?),
            Target::Missing(address) => Err(ChainError::UnknownSeries(*address)),
        }
    }
}

/// Split a world borrow into the Router at `router` and its bound Series.
fn router_and_target(world: &mut World, router: Address) -> Result<(&mut Router, Target<'_>)> {
    let router = world
        .routers
        .get_mut(&router)
        .ok_or(ChainError::UnknownRouter(router))?;
    let bound = router.series().unwrap_or_default();
    let target = match world.series.get_mut(&bound) {
        Some(series) => Target::Deployed(series),
        None => Target::Missing(bound),
    };
    Ok((router, target))
}

/// In-process ledger host.
#[derive(Debug, Default)]
pub struct Chain {
    world: World,
    log: Vec<Event>,
}

impl Chain {
    /// Empty chain with the clock at `genesis`.
    pub fn new(genesis: Timestamp) -> Self {
        Self {
            world: World {
                now: genesis,
                ..World::default()
            },
            log: Vec::new(),
        }
    }

    /// Run `call` as one unit of work.
    ///
    /// On success, events emitted during the call are published to the log.
    /// On error the world is restored to its state before the call.
    fn transact<T>(&mut self, call: impl FnOnce(&mut World) -> Result<T>) -> Result<T> {
        let checkpoint = self.world.clone();
        match call(&mut self.world) {
            Ok(value) => {
                self.publish();
                Ok(value)
            }
            Err(err) => {
                self.world = checkpoint;
                tracing::debug!(%err, "chain: call reverted");
                Err(err)
            }
        }
    }

    fn publish(&mut self) {
        let routers = self.world.routers.values_mut().map(Router::drain_events);
        let series = self.world.series.values_mut().map(Series::drain_events);
        let mut pending: Vec<Event> = routers.chain(series).flatten().collect();
        pending.sort_by_key(|event| event.sequence);
        for event in pending {
            tracing::trace!(emitter = %event.emitter, kind = event.kind.name(), "chain: event");
            self.log.push(event);
        }
    }

    // ---- Environment ----

    pub fn now(&self) -> Timestamp {
        self.world.now
    }

    /// Move the clock forward.
    ///
    /// # Errors
    ///
    /// - [`ChainError::ClockOverflow`] if the clock would overflow
    pub fn advance_time(&mut self, seconds: u64) -> Result<Timestamp> {
        let now = self.world.now;
        self.world.now = now
            .checked_add(seconds)
            .ok_or(ChainError::ClockOverflow { now, seconds })?;
        Ok(self.world.now)
    }

    /// Mint native value to a plain account.
    ///
    /// # Errors
    ///
    /// - [`ChainError::Ledger`] if the balance overflows
    pub fn fund(&mut self, account: Address, amount: Amount) -> Result<()> {
        self.transact(|world| Ok(world.bank.credit(account, amount)?))
    }

    /// Make a plain account reject (or accept again) incoming value.
    pub fn set_refusing(&mut self, account: Address, refusing: bool) {
        self.world.bank.set_refusing(account, refusing);
    }

    // ---- Deployment ----

    /// Deploy a Router at `deployer`'s next create address.
    ///
    /// # Errors
    ///
    /// - any constructor error of [`Router::new`]
    pub fn deploy_router(&mut self, deployer: Address, config: RouterConfig) -> Result<Address> {
        self.transact(|world| {
            let address = world.next_address(deployer);
            let router = Router::new(address, config)?;
            world.routers.insert(address, router);
            Ok(address)
        })
    }

    /// Deploy a Series at `deployer`'s next create address.
    ///
    /// # Errors
    ///
    /// - any constructor error of [`Series::new`]
    pub fn deploy_series(&mut self, deployer: Address, config: SeriesConfig) -> Result<Address> {
        self.transact(|world| {
            let address = world.next_address(deployer);
            let series = Series::new(address, config, world.now)?;
            world.series.insert(address, series);
            Ok(address)
        })
    }

    // ---- Value transfer ----

    /// Send plain value from `from` to `to`.
    ///
    /// A Router takes the value into custody without routing it. A Series
    /// has no plain receive path.
    ///
    /// # Errors
    ///
    /// - [`ChainError::Ledger`] if `from` lacks the balance
    /// - [`ChainError::NotPayable`] if `to` is a Series
    /// - [`ChainError::Router`] if the Router cannot account for the value
    pub fn send_value(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        self.transact(|world| {
            world.bank.debit(from, amount)?;
            let now = world.now;
            if let Some(router) = world.routers.get_mut(&to) {
                router.receive(from, amount, now)?;
            } else if world.series.contains_key(&to) {
                return Err(ChainError::NotPayable(to));
            } else {
                world.bank.credit(to, amount)?;
            }
            Ok(())
        })
    }

    // ---- Router calls ----

    /// Send `amount` to `router` and route in the same call.
    ///
    /// # Errors
    ///
    /// - [`ChainError::Ledger`] if `from` lacks the balance
    /// - any error of [`Router::receive_and_route`]
    pub fn receive_and_route(
        &mut self,
        from: Address,
        router: Address,
        amount: Amount,
    ) -> Result<RouteOutcome> {
        self.transact(|world| {
            world.bank.debit(from, amount)?;
            let now = world.now;
            let (router, mut target) = router_and_target(world, router)?;
            Ok(router.receive_and_route(from, amount, &mut target, now)?)
        })
    }

    /// Route `router`'s custody to its bound Series.
    ///
    /// # Errors
    ///
    /// - any error of [`Router::route_revenue`]
    pub fn route_revenue(&mut self, router: Address) -> Result<RouteOutcome> {
        self.transact(|world| {
            let now = world.now;
            let (router, mut target) = router_and_target(world, router)?;
            Ok(router.route_revenue(&mut target, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Router::withdraw_to_protocol`]
    pub fn withdraw_to_protocol(
        &mut self,
        caller: Address,
        router: Address,
        amount: Amount,
    ) -> Result<()> {
        self.transact(|world| {
            let now = world.now;
            let router = world
                .routers
                .get_mut(&router)
                .ok_or(ChainError::UnknownRouter(router))?;
            Ok(router.withdraw_to_protocol(caller, amount, &mut world.bank, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Router::withdraw_all_to_protocol`]
    pub fn withdraw_all_to_protocol(&mut self, caller: Address, router: Address) -> Result<Amount> {
        self.transact(|world| {
            let now = world.now;
            let router = world
                .routers
                .get_mut(&router)
                .ok_or(ChainError::UnknownRouter(router))?;
            Ok(router.withdraw_all_to_protocol(caller, &mut world.bank, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Router::emergency_withdraw`]
    pub fn emergency_withdraw(
        &mut self,
        caller: Address,
        router: Address,
        to: Address,
    ) -> Result<Amount> {
        self.transact(|world| {
            let now = world.now;
            let router = world
                .routers
                .get_mut(&router)
                .ok_or(ChainError::UnknownRouter(router))?;
            Ok(router.emergency_withdraw(caller, to, &mut world.bank, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Router::update_series_address`]
    pub fn update_series_address(
        &mut self,
        caller: Address,
        router: Address,
        series: Address,
    ) -> Result<()> {
        self.transact(|world| {
            let now = world.now;
            Ok(world
                .router_mut(router)?
                .update_series_address(caller, series, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Router::pause`]
    pub fn pause(&mut self, caller: Address, router: Address) -> Result<()> {
        self.transact(|world| {
            let now = world.now;
            Ok(world.router_mut(router)?.pause(caller, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Router::unpause`]
    pub fn unpause(&mut self, caller: Address, router: Address) -> Result<()> {
        self.transact(|world| {
            let now = world.now;
            Ok(world.router_mut(router)?.unpause(caller, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Router::transfer_ownership`]
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        router: Address,
        new_owner: Address,
    ) -> Result<()> {
        self.transact(|world| {
            let now = world.now;
            Ok(world
                .router_mut(router)?
                .transfer_ownership(caller, new_owner, now)?)
        })
    }

    // ---- Series calls ----

    /// Claim `holder`'s accrued revenue from `series` into the bank.
    ///
    /// # Errors
    ///
    /// - any error of [`Series::claim_revenue`]
    pub fn claim_revenue(&mut self, holder: Address, series: Address) -> Result<Amount> {
        self.transact(|world| {
            let now = world.now;
            let series = world
                .series
                .get_mut(&series)
                .ok_or(ChainError::UnknownSeries(series))?;
            Ok(series.claim_revenue(holder, &mut world.bank, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Series::mature_series`]
    pub fn mature_series(&mut self, caller: Address, series: Address) -> Result<()> {
        self.transact(|world| {
            let now = world.now;
            Ok(world.series_mut(series)?.mature_series(caller, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Series::transfer_shares`]
    pub fn transfer_shares(
        &mut self,
        series: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.transact(|world| {
            let now = world.now;
            Ok(world
                .series_mut(series)?
                .transfer_shares(from, to, amount, now)?)
        })
    }

    /// # Errors
    ///
    /// - any error of [`Series::burn_shares`]
    pub fn burn_shares(&mut self, series: Address, holder: Address, amount: Amount) -> Result<()> {
        self.transact(|world| {
            let now = world.now;
            Ok(world.series_mut(series)?.burn_shares(holder, amount, now)?)
        })
    }

    // ---- Views ----

    /// Native balance of a plain account.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.world.bank.balance_of(account)
    }

    /// # Errors
    ///
    /// - [`ChainError::UnknownRouter`] if nothing is deployed at `address`
    pub fn router(&self, address: &Address) -> Result<&Router> {
        self.world
            .routers
            .get(address)
            .ok_or(ChainError::UnknownRouter(*address))
    }

    /// # Errors
    ///
    /// - [`ChainError::UnknownSeries`] if nothing is deployed at `address`
    pub fn series(&self, address: &Address) -> Result<&Series> {
        self.world
            .series
            .get(address)
            .ok_or(ChainError::UnknownSeries(*address))
    }

    /// # Errors
    ///
    /// - [`ChainError::UnknownRouter`] if nothing is deployed at `address`
    pub fn router_status(&self, address: &Address) -> Result<RouterStatus> {
        Ok(self.router(address)?.status())
    }

    /// # Errors
    ///
    /// - [`ChainError::UnknownSeries`] if nothing is deployed at `address`
    pub fn series_info(&self, address: &Address) -> Result<SeriesInfo> {
        Ok(self.series(address)?.info(self.world.now))
    }

    /// # Errors
    ///
    /// - [`ChainError::UnknownSeries`] if nothing is deployed at `series`
    pub fn claimable(&self, series: &Address, holder: &Address) -> Result<Amount> {
        Ok(self.series(series)?.calculate_claimable(holder))
    }

    /// # Errors
    ///
    /// - [`ChainError::UnknownSeries`] if nothing is deployed at `series`
    pub fn share_balance(&self, series: &Address, holder: &Address) -> Result<Amount> {
        Ok(self.series(series)?.balance_of(holder))
    }

    /// Every published event, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.log
    }

    /// Published events emitted by `emitter`.
    pub fn events_for<'a>(&'a self, emitter: &'a Address) -> impl Iterator<Item = &'a Event> + 'a {
        self.log.iter().filter(move |event| &event.emitter == emitter)
    }

    /// Published events in `category`.
    pub fn events_in(&self, category: EventCategory) -> impl Iterator<Item = &Event> + '_ {
        self.log
            .iter()
            .filter(move |event| event.kind.category() == category)
    }
}
