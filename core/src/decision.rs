//! Decision chain: synthesizes one order for a squad from its situation.
//!
//! EVALUATION ORDER (fixed; first match wins):
//!   1. Fight     enemy near, or fight roll
//!   2. Backward  in the last `far_edge_margin` columns, or in danger, or backward roll
//!   3. Forward   left of centre, or too far forward, or forward roll
//!   4. Default   always Forward ("typical command")
//!
//! Every rule that is tried draws its roll, whatever its other conditions
//! say. A decision that ends at rule N has drawn exactly N rolls.

use crate::{
    command::CommandRequest,
    config::BattleConfig,
    rng::BattleRng,
    squad::{Clan, LeaderSnapshot, Squad},
    types::CommandKind,
    unit::HealthState,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SituationFlags {
    pub enemy_near:      bool,
    pub in_danger:       bool,
    pub too_far_forward: bool,
}

impl SituationFlags {
    /// Read the battlefield around `squad`.
    ///
    /// Always draws two rolls: enemy-near, then in-danger.
    pub fn assess(squad: &Squad, enemy: &Clan, config: &BattleConfig, rng: &mut BattleRng) -> Self {
        let in_range = enemy
            .squads
            .iter()
            .filter(|s| !s.is_defeated())
            .any(|s| (s.position.x - squad.position.x).abs() <= config.engage_range);
        let near_roll = rng.chance_pct(config.enemy_near_roll_pct);
        let enemy_near = in_range || near_roll;

        let hurt = squad.units.len() - squad.count_in(HealthState::Healthy);
        let crippled = !squad.units.is_empty() && hurt * 2 >= squad.units.len();
        let danger_roll = rng.chance_pct(config.in_danger_roll_pct);
        let in_danger = crippled || danger_roll;

        let too_far_forward = squad.position.x > config.field.width * 3 / 4;

        Self { enemy_near, in_danger, too_far_forward }
    }
}

/// Everything a rule may look at.
pub struct DecisionContext<'a> {
    pub clan:   &'a Clan,
    pub squad:  &'a Squad,
    pub leader: Option<&'a LeaderSnapshot>,
    pub rng:    &'a mut BattleRng,
    pub config: &'a BattleConfig,
    pub flags:  SituationFlags,
    pub now:    DateTime<Utc>,
}

/// One predicate/action pair of the chain.
#[derive(Clone, Copy)]
pub struct DecisionRule {
    pub name:    &'static str,
    pub kind:    CommandKind,
    pub note:    &'static str,
    pub matches: fn(&mut DecisionContext<'_>) -> bool,
}

impl std::fmt::Debug for DecisionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

fn fight_rule(ctx: &mut DecisionContext<'_>) -> bool {
    let roll = ctx.rng.chance_pct(ctx.config.fight_roll_pct);
    ctx.flags.enemy_near || roll
}

fn backward_rule(ctx: &mut DecisionContext<'_>) -> bool {
    let near_edge = ctx.squad.position.x >= ctx.config.field.width - ctx.config.far_edge_margin;
    let roll = ctx.rng.chance_pct(ctx.config.backward_roll_pct);
    near_edge || ctx.flags.in_danger || roll
}

fn forward_rule(ctx: &mut DecisionContext<'_>) -> bool {
    let left_of_centre = ctx.squad.position.x < ctx.config.field.center_x();
    let roll = ctx.rng.chance_pct(ctx.config.forward_roll_pct);
    left_of_centre || ctx.flags.too_far_forward || roll
}

fn default_rule(_: &mut DecisionContext<'_>) -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct DecisionChain {
    rules: Vec<DecisionRule>,
}

impl Default for DecisionChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl DecisionChain {
    /// The four-rule chain. Always produces an order.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                DecisionRule { name: "fight", kind: CommandKind::Fight, note: "engage the enemy", matches: fight_rule },
                DecisionRule { name: "backward", kind: CommandKind::Backward, note: "fall back", matches: backward_rule },
                DecisionRule { name: "forward", kind: CommandKind::Forward, note: "press forward", matches: forward_rule },
                DecisionRule { name: "default", kind: CommandKind::Forward, note: "typical command", matches: default_rule },
            ],
        }
    }

    pub fn with_rules(rules: Vec<DecisionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[DecisionRule] {
        &self.rules
    }

    /// Try each rule in order. Returns the first matching rule and its order.
    pub fn evaluate(&self, ctx: &mut DecisionContext<'_>) -> Option<(&DecisionRule, CommandRequest)> {
        let rule = self.rules.iter().find(|rule| (rule.matches)(ctx))?;
        let note = match ctx.leader {
            Some(leader) => format!("{}: {}", leader.name, rule.note),
            None => rule.note.to_string(),
        };
        let request = CommandRequest::new(ctx.clan.name.clone(), ctx.squad.id, rule.kind, ctx.now, note, 1);
        log::debug!("squad {}/{} decided {} via {}", ctx.clan.name, ctx.squad.id, rule.kind.label(), rule.name);
        Some((rule, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rng::RngSlot,
        types::Position,
        unit::Unit,
    };
    use chrono::TimeZone;

    fn clan_at(x: i32) -> Clan {
        let mut clan = Clan::new("Red");
        let mut squad = Squad::new(1, "elf", Position::new(x, 1));
        for id in 1..=4 {
            squad.units.push(Unit::new(id, format!("e{id}"), Position::new(x, 1)));
        }
        clan.squads.push(squad);
        clan.set_leader(1);
        clan
    }

    fn no_rolls() -> BattleConfig {
        BattleConfig {
            fight_roll_pct: 0,
            backward_roll_pct: 0,
            forward_roll_pct: 0,
            enemy_near_roll_pct: 0,
            in_danger_roll_pct: 0,
            ..BattleConfig::default_test()
        }
    }

    fn decide(clan: &Clan, config: &BattleConfig, flags: SituationFlags, rng: &mut BattleRng) -> (&'static str, CommandRequest) {
        let chain = DecisionChain::standard();
        let mut ctx = DecisionContext {
            clan,
            squad: &clan.squads[0],
            leader: clan.leader.as_ref(),
            rng,
            config,
            flags,
            now: Utc.timestamp_opt(0, 0).single().unwrap(),
        };
        let (rule, request) = chain.evaluate(&mut ctx).expect("standard chain always decides");
        (rule.name, request)
    }

    #[test]
    fn enemy_near_fights_after_one_roll() {
        let config = no_rolls();
        let mut rng = BattleRng::new(1, RngSlot::Battle);
        let flags = SituationFlags { enemy_near: true, ..Default::default() };
        let (rule, request) = decide(&clan_at(10), &config, flags, &mut rng);
        assert_eq!(rule, "fight");
        assert_eq!(request.kind, CommandKind::Fight);
        assert_eq!(request.steps, 1);
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn only_the_last_two_columns_fall_back() {
        let config = no_rolls();
        let width = config.field.width;
        for (x, expected) in [(width - 3, "default"), (width - 2, "backward"), (width - 1, "backward")] {
            let mut rng = BattleRng::new(1, RngSlot::Battle);
            let (rule, _) = decide(&clan_at(x), &config, SituationFlags::default(), &mut rng);
            assert_eq!(rule, expected, "x = {x}");
        }
    }

    #[test]
    fn in_danger_falls_back_after_two_rolls() {
        let config = no_rolls();
        let mut rng = BattleRng::new(1, RngSlot::Battle);
        let flags = SituationFlags { in_danger: true, ..Default::default() };
        let (rule, _) = decide(&clan_at(12), &config, flags, &mut rng);
        assert_eq!(rule, "backward");
        assert_eq!(rng.draws(), 2);
    }

    #[test]
    fn left_of_centre_presses_forward() {
        let config = no_rolls();
        let mut rng = BattleRng::new(1, RngSlot::Battle);
        let (rule, request) = decide(&clan_at(3), &config, SituationFlags::default(), &mut rng);
        assert_eq!(rule, "forward");
        assert_eq!(request.kind, CommandKind::Forward);
        assert_eq!(request.clan, "Red");
        assert_eq!(request.note, "e1: press forward");
    }

    #[test]
    fn nothing_matches_falls_to_default() {
        let config = no_rolls();
        let mut rng = BattleRng::new(1, RngSlot::Battle);
        let (rule, request) = decide(&clan_at(12), &config, SituationFlags::default(), &mut rng);
        assert_eq!(rule, "default");
        assert_eq!(request.kind, CommandKind::Forward);
        assert!(request.note.ends_with("typical command"));
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn certain_fight_roll_stops_the_chain_after_one_draw() {
        let config = BattleConfig { fight_roll_pct: 100, ..no_rolls() };
        let mut rng = BattleRng::new(1, RngSlot::Battle);
        let (rule, _) = decide(&clan_at(12), &config, SituationFlags::default(), &mut rng);
        assert_eq!(rule, "fight");
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn too_far_forward_starts_past_three_quarters() {
        let config = no_rolls();
        let enemy = Clan::new("Blue");
        let quarter = config.field.width * 3 / 4;
        for (x, expected) in [(quarter, false), (quarter + 1, true)] {
            let mut rng = BattleRng::new(1, RngSlot::Battle);
            let own = clan_at(x);
            let flags = SituationFlags::assess(&own.squads[0], &enemy, &config, &mut rng);
            assert_eq!(flags.too_far_forward, expected, "x = {x}");
            assert_eq!(rng.draws(), 2);
        }
    }

    #[test]
    fn every_seed_yields_exactly_one_rule() {
        let config = BattleConfig::default_test();
        for seed in 0..200 {
            let mut rng = BattleRng::new(seed, RngSlot::Battle);
            let x = (seed % 20) as i32;
            let (rule, request) = decide(&clan_at(x), &config, SituationFlags::default(), &mut rng);
            assert!(["fight", "backward", "forward", "default"].contains(&rule));
            assert!(request.steps >= 1);
        }
    }

    #[test]
    fn empty_chain_decides_nothing() {
        let clan = clan_at(5);
        let config = no_rolls();
        let mut rng = BattleRng::new(1, RngSlot::Battle);
        let chain = DecisionChain::with_rules(Vec::new());
        let mut ctx = DecisionContext {
            clan: &clan,
            squad: &clan.squads[0],
            leader: None,
            rng: &mut rng,
            config: &config,
            flags: SituationFlags::default(),
            now: Utc.timestamp_opt(0, 0).single().unwrap(),
        };
        assert!(chain.evaluate(&mut ctx).is_none());
    }

    #[test]
    fn assess_reads_range_and_health() {
        let config = no_rolls();
        let mut rng = BattleRng::new(1, RngSlot::Battle);
        let mut own = clan_at(8);
        let enemy = clan_at(10);
        let flags = SituationFlags::assess(&own.squads[0], &enemy, &config, &mut rng);
        assert!(flags.enemy_near);
        assert!(!flags.in_danger);
        assert!(!flags.too_far_forward);

        own.squads[0].units[0].state = HealthState::Wounded;
        own.squads[0].units[1].state = HealthState::OutOfBattle;
        own.squads[0].position.x = 16;
        let far_enemy = clan_at(0);
        let flags = SituationFlags::assess(&own.squads[0], &far_enemy, &config, &mut rng);
        assert!(!flags.enemy_near);
        assert!(flags.in_danger);
        assert!(flags.too_far_forward);
    }
}
