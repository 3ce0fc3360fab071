//! Deterministic clan generation using curated name lists.
//!
//! All generation is deterministic (same seed = same clans) and uses the
//! Generation RNG slot, so it never shifts the battle stream.

use crate::{
    config::BattleConfig,
    rng::{BattleRng, RngSlot},
    squad::{Clan, Squad},
    types::{ClanSide, Position, SquadId, UnitId},
    unit::Unit,
};

/// Deterministic clan generator
pub struct ClanGenerator {
    rng:          BattleRng,
    next_unit_id: UnitId,
}

impl ClanGenerator {
    pub fn new(seed: u64) -> Self {
        Self { rng: BattleRng::new(seed, RngSlot::Generation), next_unit_id: 1 }
    }

    /// Generate both clans of a session. Unit ids are unique across the pair.
    pub fn generate_pair(seed: u64, name_a: &str, name_b: &str, config: &BattleConfig) -> (Clan, Clan) {
        let mut generator = Self::new(seed);
        let a = generator.generate(name_a, ClanSide::A, config);
        let b = generator.generate(name_b, ClanSide::B, config);
        (a, b)
    }

    /// Generate one clan. Side A deploys at the left edge, side B at the right.
    /// The first unit of the first squad becomes leader.
    pub fn generate(&mut self, name: &str, side: ClanSide, config: &BattleConfig) -> Clan {
        let field = config.field;
        let start_x = match side {
            ClanSide::A => field.clamp_x(1),
            ClanSide::B => field.clamp_x(field.width - 2),
        };
        let lanes = config.squads_per_clan.max(1) as i32;

        let mut clan = Clan::new(name);
        for index in 0..config.squads_per_clan {
            let y = (index as i32 * field.height) / lanes;
            let kind = *self.rng.pick(Self::squad_kinds());
            let mut squad = Squad::new(index as SquadId + 1, kind, Position::new(start_x, y));
            for _ in 0..config.units_per_squad {
                let id = self.next_unit_id;
                self.next_unit_id += 1;
                squad.units.push(Unit::new(id, self.unit_name(), Position::new(start_x, y)));
            }
            clan.squads.push(squad);
        }

        if let Some(first) = clan.squads.first().and_then(|s| s.units.first()).map(|u| u.id) {
            clan.set_leader(first);
        }
        log::debug!("generated clan {name}: {} squads", clan.squads.len());
        clan
    }

    fn unit_name(&mut self) -> String {
        let first = *self.rng.pick(Self::given_names());
        let epithet = *self.rng.pick(Self::epithets());
        format!("{first} {epithet}")
    }

    fn squad_kinds() -> &'static [&'static str] {
        &["human", "orc", "elf", "dwarf", "goblin", "troll"]
    }

    fn given_names() -> &'static [&'static str] {
        &[
            "Aldric", "Bran", "Cedric", "Dagna", "Edda", "Falk", "Gorm", "Hilde",
            "Ivar", "Jorunn", "Kettil", "Lif", "Magnus", "Njal", "Orm", "Ragna",
            "Sigrid", "Thora", "Ulf", "Vigdis", "Yrsa", "Torvald", "Grima", "Halvar",
        ]
    }

    fn epithets() -> &'static [&'static str] {
        &[
            "the Bold", "Ironhand", "the Quiet", "Stonejaw", "the Swift", "Ashborn",
            "Redbeard", "the Lame", "Wolfsbane", "the Elder", "Oakshield", "the Grim",
        ]
    }
}
