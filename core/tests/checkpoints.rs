//! Checkpoint isolation and persistence across store handles.

use clanwar_core::{
    checkpoint::CheckpointStore,
    clock::TurnClock,
    config::BattleConfig,
    session::GameSession,
    store::{LoadOutcome, SimStore},
};

fn session() -> GameSession {
    GameSession::generate(77, BattleConfig::default_test(), "Red", "Blue").with_clock(TurnClock::frozen_epoch())
}

#[test]
fn checkpoint_survives_further_play() {
    let mut s = session();
    let mut checkpoints = CheckpointStore::new();
    s.autonomous_turn();
    let saved = checkpoints.create_checkpoint(&mut s, "turn-1").clone();

    for _ in 0..10 {
        s.autonomous_turn();
    }
    assert_eq!(checkpoints.find("turn-1").unwrap(), &saved);
    assert_eq!(saved.snapshot.turn, 1);
}

#[test]
fn restore_then_replay_matches_original_continuation() {
    let mut s = session();
    let mut checkpoints = CheckpointStore::new();
    for _ in 0..3 {
        s.autonomous_turn();
    }
    checkpoints.create_checkpoint(&mut s, "mid");
    for _ in 0..5 {
        s.autonomous_turn();
    }
    let original = s.snapshot();

    checkpoints.restore_named(&mut s, "mid").unwrap();
    assert_eq!(s.turn(), 3);
    for _ in 0..5 {
        s.autonomous_turn();
    }
    let replay = s.snapshot();
    assert_eq!(replay.clan_a, original.clan_a);
    assert_eq!(replay.clan_b, original.clan_b);
    assert_eq!(replay.rng_draws, original.rng_draws);
}

#[test]
fn checkpoints_persist_to_file_and_reload() {
    let path = std::env::temp_dir().join(format!("clanwar-{}.db", std::process::id()));
    let path = path.to_string_lossy().to_string();
    let _ = std::fs::remove_file(&path);

    let mut s = session();
    let mut checkpoints = CheckpointStore::new();
    checkpoints.create_checkpoint(&mut s, "opening");
    s.autonomous_turn();
    checkpoints.create_checkpoint(&mut s, "");

    {
        let store = SimStore::open(&path).unwrap();
        store.migrate().unwrap();
        checkpoints.save(&store).unwrap();
    }

    let store = SimStore::open(&path).unwrap();
    let mut reloaded = CheckpointStore::new();
    assert_eq!(reloaded.load(&store), LoadOutcome::Loaded(2));
    assert_eq!(reloaded.checkpoints(), checkpoints.checkpoints());

    let mut other = session();
    reloaded.restore_named(&mut other, "opening").unwrap();
    assert_eq!(other.turn(), 0);

    drop(store);
    let _ = std::fs::remove_file(&path);
}
