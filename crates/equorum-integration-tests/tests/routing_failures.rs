//! Integration test: failure paths keep funds and totals intact.
//!
//! 1. A matured Series rejects revenue; the Router keeps custody and counts
//!    each attempt
//! 2. Refused payouts (claim, withdrawal, emergency sweep) change nothing
//! 3. The emergency sweep empties custody without touching routed/returned
//! 4. The Series binding is one-shot
//! 5. A Series with no shares, or a split too small to deliver, is a soft
//!    failure
//! 6. Custody conservation holds across random call sequences

use equorum_integration_tests::{Deployment, DURATION, HOLDER, OWNER, PAYER, PROTOCOL};
use equorum_ledger::PayoutError;
use equorum_router::{RouteOutcome, RouterConfig, RouterError};
use equorum_runtime::ChainError;
use equorum_series::SeriesError;
use equorum_types::events::EventKind;
use equorum_types::{units, Address, U256};
use proptest::prelude::*;

const RESCUE: Address = Address::repeat_byte(0x4E);

#[test]
fn matured_series_rejection_preserves_custody() {
    // =========================================================
    // Setup: matured Series, 10 units in Router custody
    // =========================================================
    let mut d = Deployment::standard().expect("deploy");
    d.chain.advance_time(DURATION + 1).expect("advance");
    d.chain.mature_series(HOLDER, d.series).expect("mature");
    d.chain
        .send_value(PAYER, d.router, units(10))
        .expect("send");

    // =========================================================
    // Every attempt is rejected and counted exactly once
    // =========================================================
    for attempt in 1..=3u64 {
        let outcome = d.chain.route_revenue(d.router).expect("route is a soft failure");
        assert_eq!(
            outcome,
            RouteOutcome::Rejected {
                attempted: units(2),
                reason: SeriesError::AlreadyMatured.to_string(),
            }
        );
        let status = d.chain.router_status(&d.router).expect("status");
        assert_eq!(status.custody, units(10));
        assert_eq!(status.failed_route_count, attempt);
        assert_eq!(status.total_routed_to_series, U256::ZERO);
    }

    let failures = d
        .chain
        .events_for(&d.router)
        .filter(|event| matches!(event.kind, EventKind::RouteAttemptFailed { .. }))
        .count();
    assert_eq!(failures, 3);

    // The protocol recovers everything.
    let amount = d
        .chain
        .withdraw_all_to_protocol(PROTOCOL, d.router)
        .expect("withdraw");
    assert_eq!(amount, units(10));
}

#[test]
fn refused_claim_changes_nothing() {
    let mut d = Deployment::standard().expect("deploy");
    d.allot(HOLDER, 100_000).expect("allot");
    d.chain
        .receive_and_route(PAYER, d.router, units(10))
        .expect("deposit");

    d.chain.set_refusing(HOLDER, true);
    let before = d.chain.series_info(&d.series).expect("info");
    let events_before = d.chain.events().len();

    assert_eq!(
        d.chain.claim_revenue(HOLDER, d.series),
        Err(ChainError::Series(SeriesError::Payout(PayoutError::Refused {
            to: HOLDER,
            amount: units(2) / U256::from(10u64),
        })))
    );
    assert_eq!(d.chain.series_info(&d.series).expect("info"), before);
    assert_eq!(d.chain.events().len(), events_before);

    // Accepting again makes the same amount claimable.
    d.chain.set_refusing(HOLDER, false);
    assert_eq!(
        d.chain.claim_revenue(HOLDER, d.series).expect("claim"),
        units(2) / U256::from(10u64)
    );
}

#[test]
fn refused_withdrawals_change_nothing() {
    let mut d = Deployment::standard().expect("deploy");
    d.chain
        .send_value(PAYER, d.router, units(10))
        .expect("send");

    d.chain.set_refusing(PROTOCOL, true);
    d.chain.set_refusing(RESCUE, true);
    let before = d.chain.router_status(&d.router).expect("status");

    assert!(matches!(
        d.chain.withdraw_to_protocol(OWNER, d.router, units(1)),
        Err(ChainError::Router(RouterError::Payout(_)))
    ));
    assert!(matches!(
        d.chain.withdraw_all_to_protocol(PROTOCOL, d.router),
        Err(ChainError::Router(RouterError::Payout(_)))
    ));
    assert!(matches!(
        d.chain.emergency_withdraw(OWNER, d.router, RESCUE),
        Err(ChainError::Router(RouterError::Payout(_)))
    ));
    assert_eq!(d.chain.router_status(&d.router).expect("status"), before);
}

#[test]
fn emergency_sweep_bypasses_counters() {
    let mut d = Deployment::standard().expect("deploy");
    d.chain
        .receive_and_route(PAYER, d.router, units(10))
        .expect("deposit");
    d.chain
        .withdraw_to_protocol(PROTOCOL, d.router, units(3))
        .expect("withdraw");

    assert_eq!(
        d.chain.emergency_withdraw(PROTOCOL, d.router, RESCUE),
        Err(ChainError::Router(RouterError::Unauthorized { caller: PROTOCOL }))
    );
    let swept = d
        .chain
        .emergency_withdraw(OWNER, d.router, RESCUE)
        .expect("sweep");
    assert_eq!(swept, units(5));
    assert_eq!(d.chain.balance_of(&RESCUE), units(5));

    let status = d.chain.router_status(&d.router).expect("status");
    assert_eq!(status.custody, U256::ZERO);
    assert_eq!(status.total_routed_to_series, units(2));
    assert_eq!(status.total_returned_to_protocol, units(3));
    assert_eq!(status.total_emergency_withdrawn, units(5));
    assert!(d
        .chain
        .router(&d.router)
        .expect("router")
        .counters()
        .is_conserved());

    assert_eq!(
        d.chain.emergency_withdraw(OWNER, d.router, RESCUE),
        Err(ChainError::Router(RouterError::NoBalance))
    );
}

#[test]
fn series_binding_is_one_shot() {
    let mut d = Deployment::standard().expect("deploy");
    let other = Address::repeat_byte(0x77);
    assert_eq!(
        d.chain.update_series_address(OWNER, d.router, other),
        Err(ChainError::Router(RouterError::AlreadySet))
    );
    assert_eq!(
        d.chain.router_status(&d.router).expect("status").series,
        Some(d.series)
    );
}

#[test]
fn only_the_router_can_deposit() {
    let mut d = Deployment::standard().expect("deploy");

    // A second Router pointed at the same Series is refused by it.
    let stray = d
        .chain
        .deploy_router(
            PAYER,
            RouterConfig {
                protocol: PROTOCOL,
                owner: OWNER,
                series: Some(d.series),
                share_bps: 5_000,
            },
        )
        .expect("deploy stray router");
    let outcome = d
        .chain
        .receive_and_route(PAYER, stray, units(4))
        .expect("soft failure");
    assert_eq!(
        outcome,
        RouteOutcome::Rejected {
            attempted: units(2),
            reason: SeriesError::Unauthorized { caller: stray }.to_string(),
        }
    );
    assert_eq!(d.chain.router(&stray).expect("stray").custody(), units(4));

    // The bound Router is unaffected.
    let outcome = d
        .chain
        .receive_and_route(PAYER, d.router, units(4))
        .expect("deposit");
    assert!(outcome.is_routed());
    assert_eq!(
        d.chain.series_info(&d.series).expect("info").total_revenue_received,
        units(4) / U256::from(5u64)
    );
}

#[test]
fn shareless_series_rejection_preserves_custody() {
    let mut d = Deployment::new(2_000, U256::ZERO, 100).expect("deploy");
    d.chain
        .send_value(PAYER, d.router, units(10))
        .expect("send");

    let outcome = d.chain.route_revenue(d.router).expect("route is a soft failure");
    assert_eq!(
        outcome,
        RouteOutcome::Rejected {
            attempted: units(2),
            reason: SeriesError::NoShares.to_string(),
        }
    );
    let status = d.chain.router_status(&d.router).expect("status");
    assert_eq!(status.custody, units(10));
    assert_eq!(status.failed_route_count, 1);
    assert_eq!(status.total_routed_to_series, U256::ZERO);
}

#[test]
fn burning_every_share_stops_deliveries() {
    let mut d = Deployment::standard().expect("deploy");
    d.chain
        .burn_shares(d.series, PROTOCOL, units(1_000_000))
        .expect("burn whole supply");
    assert_eq!(
        d.chain.series(&d.series).expect("series").total_supply(),
        U256::ZERO
    );

    let outcome = d
        .chain
        .receive_and_route(PAYER, d.router, units(5))
        .expect("soft failure");
    assert_eq!(
        outcome,
        RouteOutcome::Rejected {
            attempted: units(1),
            reason: SeriesError::NoShares.to_string(),
        }
    );
    let status = d.chain.router_status(&d.router).expect("status");
    assert_eq!(status.custody, units(5));
    assert_eq!(status.failed_route_count, 1);
}

#[test]
fn dust_custody_split_is_rejected() {
    let mut d = Deployment::standard().expect("deploy");
    let dust = U256::from(1u64);
    d.chain.send_value(PAYER, d.router, dust).expect("send");

    // 20% of one base unit rounds down to nothing.
    let outcome = d.chain.route_revenue(d.router).expect("route is a soft failure");
    assert_eq!(
        outcome,
        RouteOutcome::Rejected {
            attempted: U256::ZERO,
            reason: SeriesError::InvalidAmount.to_string(),
        }
    );
    let status = d.chain.router_status(&d.router).expect("status");
    assert_eq!(status.custody, dust);
    assert_eq!(status.failed_route_count, 1);
    assert_eq!(
        d.chain.series_info(&d.series).expect("info").total_revenue_received,
        U256::ZERO
    );
}

#[derive(Clone, Debug)]
enum Call {
    Send(u64),
    ReceiveAndRoute(u64),
    Route,
    Withdraw(u64),
    WithdrawAll,
    Emergency,
    TogglePause,
    Claim,
    Mature,
    Refuse(bool),
}

fn call() -> impl Strategy<Value = Call> {
    prop_oneof![
        (1u64..20).prop_map(Call::Send),
        (1u64..20).prop_map(Call::ReceiveAndRoute),
        Just(Call::Route),
        (1u64..20).prop_map(Call::Withdraw),
        Just(Call::WithdrawAll),
        Just(Call::Emergency),
        Just(Call::TogglePause),
        Just(Call::Claim),
        Just(Call::Mature),
        any::<bool>().prop_map(Call::Refuse),
    ]
}

proptest! {
    #[test]
    fn custody_is_conserved_across_any_sequence(calls in proptest::collection::vec(call(), 1..50)) {
        let mut d = Deployment::new(2_000, units(1_000_000), 10_000).expect("deploy");
        d.allot(HOLDER, 300_000).expect("allot");
        d.chain.advance_time(DURATION).expect("advance");

        for call in calls {
            let before = d.chain.router_status(&d.router).expect("status");
            let series_before = d.chain.series_info(&d.series).expect("info");
            let result = match call {
                Call::Send(n) => d.chain.send_value(PAYER, d.router, units(n)),
                Call::ReceiveAndRoute(n) => d.chain.receive_and_route(PAYER, d.router, units(n)).map(|_| ()),
                Call::Route => d.chain.route_revenue(d.router).map(|_| ()),
                Call::Withdraw(n) => d.chain.withdraw_to_protocol(PROTOCOL, d.router, units(n)),
                Call::WithdrawAll => d.chain.withdraw_all_to_protocol(OWNER, d.router).map(|_| ()),
                Call::Emergency => d.chain.emergency_withdraw(OWNER, d.router, RESCUE).map(|_| ()),
                Call::TogglePause => {
                    if before.paused {
                        d.chain.unpause(OWNER, d.router)
                    } else {
                        d.chain.pause(OWNER, d.router)
                    }
                }
                Call::Claim => d.chain.claim_revenue(HOLDER, d.series).map(|_| ()),
                Call::Mature => d.chain.mature_series(PAYER, d.series),
                Call::Refuse(refusing) => {
                    d.chain.set_refusing(PROTOCOL, refusing);
                    Ok(())
                }
            };

            let router = d.chain.router(&d.router).expect("router");
            prop_assert!(router.counters().is_conserved());
            if result.is_err() {
                prop_assert_eq!(d.chain.router_status(&d.router).expect("status"), before);
                prop_assert_eq!(d.chain.series_info(&d.series).expect("info"), series_before);
            }

            let info = d.chain.series_info(&d.series).expect("info");
            prop_assert_eq!(info.total_revenue_received, router.counters().total_routed_to_series);
            prop_assert_eq!(
                info.custody,
                info.total_revenue_received - info.total_claimed
            );
        }
    }
}
