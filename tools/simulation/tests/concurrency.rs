//! Full-stack race tests
//!
//! Hammers one live game from many threads and checks the invariants that
//! must survive any interleaving: share conservation between orders and
//! trades, no same-team executions, and exactly-once settlement.

use rust_decimal::Decimal;
use settlement::CloseOutcome;
use simulation::harness::{GameSim, SimConfig};
use std::sync::Arc;
use std::thread;

fn contended_config() -> SimConfig {
    SimConfig {
        // Every failed attempt coincides with another thread's commit, so a
        // large budget only buys patience, not livelock.
        max_txn_attempts: 10_000,
        ..SimConfig::default()
    }
}

#[test]
fn test_parallel_placements_conserve_shares() {
    let roster = [
        ("p0", "reds"),
        ("p1", "reds"),
        ("p2", "reds"),
        ("p3", "reds"),
        ("p4", "blues"),
        ("p5", "blues"),
        ("p6", "blues"),
        ("p7", "blues"),
    ];
    let sim = Arc::new(GameSim::start(contended_config(), &roster).unwrap());
    let sum = sim.symbols()[0].clone();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let sim = Arc::clone(&sim);
            let sum = sum.clone();
            let player = format!("p{}", i);
            thread::spawn(move || {
                for j in 0..25 {
                    let side = if (i + j) % 2 == 0 { "buy" } else { "sell" };
                    let price = Decimal::from(8 + ((i + j) % 5) as u32);
                    sim.place(&player, &sum, side, price, 1 + (j % 3) as i64)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let orders = sim.store.list_orders(&sim.game_id, &sum);
    assert_eq!(orders.len(), 200);

    let consumed: u64 = orders
        .iter()
        .map(|o| u64::from(o.shares_original.get() - o.shares_remaining.get()))
        .sum();
    let traded: u64 = sim
        .trades(&sum)
        .iter()
        .map(|t| u64::from(t.qty.get()))
        .sum();
    // Each trade consumes its quantity from one buy and one sell.
    assert_eq!(consumed, traded * 2);

    for trade in sim.trades(&sum) {
        assert_ne!(trade.buyer.team_id, trade.seller.team_id);
    }
    for order in &orders {
        assert!(order.check_invariant());
    }
}

#[test]
fn test_racing_closes_settle_exactly_once() {
    let sim = Arc::new(
        GameSim::start(contended_config(), &[("ana", "reds"), ("cyn", "blues")]).unwrap(),
    );
    let sum = sim.symbols()[0].clone();
    sim.place("ana", &sum, "sell", Decimal::from(8), 5).unwrap();
    sim.place("cyn", &sum, "buy", Decimal::from(10), 5).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let sim = Arc::clone(&sim);
            let player = if i % 2 == 0 { "ana" } else { "cyn" };
            thread::spawn(move || sim.close(player))
        })
        .collect();

    let mut fresh_closes = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(CloseOutcome::Closed { .. }) => fresh_closes += 1,
            Ok(CloseOutcome::AlreadyClosed { .. }) => {}
            // Attempts that land while the winner is mid-settlement are
            // rejected by the fence.
            Err(err) => assert_eq!(err.code(), "failed-precondition"),
        }
    }
    assert_eq!(fresh_closes, 1);

    // Settlement effects applied exactly once: the lone trade at 9 against
    // final price 0 moves 45 from blues to reds.
    let teams = sim.store.list_teams(&sim.game_id);
    let reds = teams.iter().find(|t| t.name == "reds").unwrap();
    let blues = teams.iter().find(|t| t.name == "blues").unwrap();
    assert_eq!(reds.balance, Decimal::from(45));
    assert_eq!(blues.balance, Decimal::from(-45));
}
