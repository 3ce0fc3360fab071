//! Same seed + same orders = identical units and identical log.

use clanwar_core::{clock::TurnClock, config::BattleConfig, session::GameSession};

fn play(seed: u64, turns: usize) -> (String, String) {
    let mut s = GameSession::generate(seed, BattleConfig::default_test(), "Red", "Blue")
        .with_clock(TurnClock::frozen_epoch());
    for _ in 0..turns {
        s.autonomous_turn();
    }
    let snapshot = serde_json::to_string(&s.snapshot()).unwrap();
    let log = serde_json::to_string(s.command_log().entries()).unwrap();
    (snapshot, log)
}

#[test]
fn identical_seeds_produce_identical_runs() {
    let first = play(31337, 30);
    let second = play(31337, 30);
    assert_eq!(first.0, second.0, "unit state diverged");
    assert_eq!(first.1, second.1, "command log diverged");
}

#[test]
fn different_seeds_diverge() {
    let first = play(1, 30);
    let second = play(2, 30);
    assert_ne!(first.0, second.0);
}
