//! Integration test: revenue from receipt to claim.
//!
//! Exercises the complete lifecycle:
//! 1. Deploy and bind a Router/Series pair
//! 2. Receive revenue at the Router and route the Series' share
//! 3. Holders claim their proportional entitlement
//! 4. The protocol withdraws what the Router kept
//! 5. Shares change hands between deposits
//! 6. The Series matures and stops accepting revenue

use equorum_integration_tests::{Deployment, BUYER, DURATION, HOLDER, OWNER, PAYER, PROTOCOL};
use equorum_router::{RouteOutcome, RouterError};
use equorum_runtime::ChainError;
use equorum_series::{Maturity, SeriesError};
use equorum_types::events::{Event, EventKind};
use equorum_types::{units, U256};

/// `n` hundredths of a unit.
fn cents(n: u64) -> U256 {
    units(n) / U256::from(100u64)
}

#[test]
fn single_deposit_single_claim() {
    // =========================================================
    // Setup: 1,000,000 shares, holder owns 100,000
    // =========================================================
    let mut d = Deployment::standard().expect("deploy");
    d.allot(HOLDER, 100_000).expect("allot");

    // =========================================================
    // Receive 1.0 at 2000 bps and route
    // =========================================================
    d.chain
        .send_value(PAYER, d.router, units(1))
        .expect("send should succeed");
    let outcome = d.chain.route_revenue(d.router).expect("route should succeed");
    assert_eq!(
        outcome,
        RouteOutcome::Routed {
            to_series: cents(20),
            retained: cents(80),
        }
    );

    let status = d.chain.router_status(&d.router).expect("status");
    assert_eq!(status.total_routed_to_series, cents(20));
    assert_eq!(status.custody, cents(80));

    // =========================================================
    // Holder claims 0.02 exactly once
    // =========================================================
    assert_eq!(
        d.chain.claimable(&d.series, &HOLDER).expect("claimable"),
        cents(2)
    );
    let claimed = d
        .chain
        .claim_revenue(HOLDER, d.series)
        .expect("first claim should succeed");
    assert_eq!(claimed, cents(2));
    assert_eq!(d.chain.balance_of(&HOLDER), cents(2));

    assert_eq!(
        d.chain.claim_revenue(HOLDER, d.series),
        Err(ChainError::Series(SeriesError::NothingToClaim))
    );

    // The protocol still owns 90% of the shares.
    assert_eq!(
        d.chain.claimable(&d.series, &PROTOCOL).expect("claimable"),
        cents(18)
    );
}

#[test]
fn protocol_withdraws_retained_revenue() {
    let mut d = Deployment::standard().expect("deploy");
    d.chain
        .receive_and_route(PAYER, d.router, units(10))
        .expect("receive and route");

    d.chain
        .withdraw_to_protocol(PROTOCOL, d.router, units(3))
        .expect("partial withdrawal");
    let rest = d
        .chain
        .withdraw_all_to_protocol(OWNER, d.router)
        .expect("full withdrawal");
    assert_eq!(rest, units(5));
    assert_eq!(d.chain.balance_of(&PROTOCOL), units(8));

    let status = d.chain.router_status(&d.router).expect("status");
    assert_eq!(status.custody, U256::ZERO);
    assert_eq!(status.total_returned_to_protocol, units(8));
    assert!(!status.can_route_now);

    assert_eq!(
        d.chain.route_revenue(d.router),
        Err(ChainError::Router(RouterError::NoBalance))
    );
}

#[test]
fn routing_resplits_retained_custody() {
    let mut d = Deployment::standard().expect("deploy");
    d.chain
        .send_value(PAYER, d.router, units(10))
        .expect("send");

    d.chain.route_revenue(d.router).expect("first route");
    let second = d.chain.route_revenue(d.router).expect("second route");

    // 20% of the 8 units kept by the first split.
    assert_eq!(second.routed_amount(), cents(160));
    let status = d.chain.router_status(&d.router).expect("status");
    assert_eq!(status.total_routed_to_series, cents(360));
    assert_eq!(status.custody, cents(640));
}

#[test]
fn share_transfer_between_deposits() {
    let mut d = Deployment::standard().expect("deploy");
    d.allot(HOLDER, 500_000).expect("allot");

    // First deposit: 2 units to the Series, half of it accrues to the holder.
    d.chain
        .receive_and_route(PAYER, d.router, units(10))
        .expect("first deposit");
    assert_eq!(d.chain.claimable(&d.series, &HOLDER).expect("claimable"), units(1));

    // Holder sells everything to the buyer.
    d.chain
        .transfer_shares(d.series, HOLDER, BUYER, units(500_000))
        .expect("transfer");
    assert_eq!(d.chain.claimable(&d.series, &BUYER).expect("claimable"), U256::ZERO);
    assert_eq!(d.chain.claimable(&d.series, &HOLDER).expect("claimable"), units(1));

    // Withdraw so the next routing only splits fresh revenue.
    d.chain
        .withdraw_all_to_protocol(PROTOCOL, d.router)
        .expect("withdraw");
    d.chain
        .receive_and_route(PAYER, d.router, units(10))
        .expect("second deposit");

    assert_eq!(d.chain.claimable(&d.series, &BUYER).expect("claimable"), units(1));
    assert_eq!(d.chain.claimable(&d.series, &HOLDER).expect("claimable"), units(1));

    assert_eq!(d.chain.claim_revenue(HOLDER, d.series).expect("seller claims"), units(1));
    assert_eq!(d.chain.claim_revenue(BUYER, d.series).expect("buyer claims"), units(1));

    let info = d.chain.series_info(&d.series).expect("info");
    assert_eq!(info.total_revenue_received, units(4));
    assert_eq!(info.total_claimed, units(2));
    assert_eq!(info.custody, units(2));
}

#[test]
fn maturity_closes_inflow_but_not_claims() {
    let mut d = Deployment::standard().expect("deploy");
    d.allot(HOLDER, 100_000).expect("allot");
    d.chain
        .receive_and_route(PAYER, d.router, units(10))
        .expect("deposit");

    d.chain.advance_time(DURATION).expect("advance");
    d.chain.mature_series(PAYER, d.series).expect("mature");
    let info = d.chain.series_info(&d.series).expect("info");
    assert_eq!(
        info.maturity,
        Maturity::Matured {
            at: d.chain.now()
        }
    );
    assert_eq!(info.time_until_maturity, 0);

    assert_eq!(
        d.chain.mature_series(PAYER, d.series),
        Err(ChainError::Series(SeriesError::AlreadyMatured))
    );

    // Routing now fails softly and keeps everything in custody.
    let custody = d.chain.router(&d.router).expect("router").custody();
    let outcome = d.chain.route_revenue(d.router).expect("route");
    assert!(!outcome.is_routed());
    assert_eq!(d.chain.router(&d.router).expect("router").custody(), custody);

    // Accrued revenue is still claimable.
    assert_eq!(d.chain.claim_revenue(HOLDER, d.series).expect("claim"), cents(20));
}

#[test]
fn lifecycle_events_in_order() {
    let mut d = Deployment::standard().expect("deploy");
    d.allot(HOLDER, 100_000).expect("allot");
    d.chain
        .receive_and_route(PAYER, d.router, units(1))
        .expect("deposit");
    d.chain.claim_revenue(HOLDER, d.series).expect("claim");

    let router_events: Vec<_> = d
        .chain
        .events_for(&d.router)
        .map(|event| event.kind.name())
        .collect();
    assert_eq!(
        router_events,
        vec!["SeriesAddressUpdated", "RevenueReceived", "RevenueRouted"]
    );

    let series_events: Vec<_> = d
        .chain
        .events_for(&d.series)
        .map(|event| event.kind.clone())
        .collect();
    assert!(matches!(series_events[0], EventKind::SharesTransferred { .. }));
    assert!(matches!(
        series_events[1],
        EventKind::SeriesRevenueReceived { amount, .. } if amount == cents(20)
    ));
    assert_eq!(
        series_events[2],
        EventKind::RevenueClaimed {
            holder: HOLDER,
            amount: cents(2),
        }
    );
}

#[test]
fn cross_contract_events_follow_emission_order() {
    let mut d = Deployment::standard().expect("deploy");
    d.allot(HOLDER, 100_000).expect("allot");
    let mark = d.chain.events().len();

    d.chain
        .receive_and_route(PAYER, d.router, units(1))
        .expect("deposit");
    d.chain.claim_revenue(HOLDER, d.series).expect("claim");

    // The Series accepts the deposit before the Router records it as routed.
    let names: Vec<_> = d.chain.events()[mark..]
        .iter()
        .map(|event| event.kind.name())
        .collect();
    assert_eq!(
        names,
        vec![
            "RevenueReceived",
            "SeriesRevenueReceived",
            "RevenueRouted",
            "RevenueClaimed",
        ]
    );
    assert!(d
        .chain
        .events()
        .windows(2)
        .all(|pair| pair[0].sequence < pair[1].sequence));

    // The published log is what downstream consumers read as JSON.
    let json = serde_json::to_string(d.chain.events()).expect("serialize");
    let parsed: Vec<Event> = serde_json::from_str(&json).expect("parse");
    assert_eq!(parsed, d.chain.events());
}
