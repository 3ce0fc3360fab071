//! battle-runner: headless clan battle runner.
//!
//! Usage:
//!   battle-runner --seed 12345 --turns 40 --db battle.db
//!   battle-runner --seed 12345 --config battle.json --checkpoint-every 10
//!   battle-runner --db battle.db --restore turn-20 --turns 10
//!   battle-runner --seed 7 --series 5 --turns 0

use anyhow::Result;
use clanwar_core::{
    checkpoint::CheckpointStore,
    config::BattleConfig,
    session::{GameSession, SessionSummary},
    store::{LoadOutcome, SimStore},
    types::ClanSide,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let turns = parse_arg(&args, "--turns", 40u64);
    let every = parse_arg(&args, "--checkpoint-every", 10u64);
    let series = parse_arg(&args, "--series", 0u32);
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let restore = string_arg(&args, "--restore");
    let config = match string_arg(&args, "--config") {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    let json = args.iter().any(|a| a == "--json");

    if !json {
        println!("Clan War battle-runner");
        println!("  seed:      {seed}");
        println!("  turns:     {turns}");
        println!("  db:        {db}");
        println!("  field:     {}x{}", config.field.width, config.field.height);
        println!();
    }

    let store = SimStore::open(db)?;
    store.migrate()?;

    let mut session = GameSession::generate(seed, config, "Ironfang", "Stormcrow");
    let mut checkpoints = CheckpointStore::new();
    match checkpoints.load(&store) {
        LoadOutcome::Loaded(n) => log::info!("loaded {n} checkpoints"),
        LoadOutcome::Missing => log::info!("no stored checkpoints"),
        LoadOutcome::Corrupt(reason) => log::warn!("stored checkpoints ignored: {reason}"),
    }

    if let Some(name) = restore {
        checkpoints.restore_named(&mut session, name)?;
        if !json {
            println!("  restored '{name}' at turn {}", session.turn());
        }
    }

    if series > 0 {
        let side = session.active_side();
        let entries = session.run_command_series(side, series);
        log::info!("{} routed {} leader orders", session.clan(side).name, entries.len());
    }

    let started = session.turn();
    while session.turn() < started + turns {
        if let Some(side) = session.winner() {
            log::info!("{} wins at turn {}", session.clan(side).name, session.turn());
            break;
        }
        session.autonomous_turn();
        if every > 0 && session.turn() % every == 0 {
            let name = format!("turn-{}", session.turn());
            checkpoints.create_checkpoint(&mut session, &name);
        }
    }

    checkpoints.save(&store)?;
    session.save_records(&store)?;

    let summary = session.summary();
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        print_summary(&session, &summary, &checkpoints);
    }
    Ok(())
}

fn print_summary(session: &GameSession, summary: &SessionSummary, checkpoints: &CheckpointStore) {
    println!("=== BATTLE SUMMARY ===");
    println!("  final turn:     {}", summary.turn);
    println!("  to act:         {:?}", summary.active);
    for (name, health) in [&summary.clan_a, &summary.clan_b] {
        println!(
            "  {name:<14}  healthy {:>3} | wounded {:>3} | out {:>3}",
            health.healthy, health.wounded, health.out_of_battle
        );
    }
    println!("  history:        {}", summary.history);
    println!("  log entries:    {}", summary.log);
    println!("  checkpoints:    {}", checkpoints.names().join(", "));
    match session.winner() {
        Some(ClanSide::A) => println!("  winner:         {}", summary.clan_a.0),
        Some(ClanSide::B) => println!("  winner:         {}", summary.clan_b.0),
        None => println!("  winner:         (undecided)"),
    }

    println!();
    println!("=== LAST ORDERS ===");
    let entries = session.command_log().entries();
    for entry in entries.iter().rev().take(6).rev() {
        println!(
            "  {} {:<10} squad {:>2} ({:<6}) {:<8} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.clan,
            entry.squad_id,
            entry.squad_kind,
            entry.kind.label(),
            entry.summary
        );
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
