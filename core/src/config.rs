//! Battle configuration: field bounds, combat odds, retention limits.
//!
//! Loaded from a single JSON file by the runner. Tests use
//! `BattleConfig::default_test()`. Every field has a serde default so a
//! partial file is valid.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldConfig {
    pub width:  i32,
    pub height: i32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self { width: 40, height: 12 }
    }
}

impl FieldConfig {
    /// Clamp an x coordinate into `[0, width - 1]`.
    pub fn clamp_x(&self, x: i32) -> i32 {
        x.clamp(0, (self.width - 1).max(0))
    }

    pub fn center_x(&self) -> i32 {
        self.width / 2
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BattleConfig {
    pub field: FieldConfig,
    /// Percent chance (0..=100) that a fighting unit is hit.
    pub hit_chance_pct: u32,
    /// Game-command history entries kept in a snapshot.
    pub history_limit: usize,
    /// Executed commands the invoker keeps for undo.
    pub undo_limit: usize,
    pub squads_per_clan: usize,
    pub units_per_squad: usize,
    /// Distance in tiles at which an enemy squad counts as near.
    pub engage_range: i32,
    /// Columns at the far edge that force a retreat.
    pub far_edge_margin: i32,
    // ── Decision chain rolls ─────────────────────────
    pub fight_roll_pct: u32,
    pub backward_roll_pct: u32,
    pub forward_roll_pct: u32,
    // ── Situational rolls ────────────────────────────
    pub enemy_near_roll_pct: u32,
    pub in_danger_roll_pct: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            field:               FieldConfig::default(),
            hit_chance_pct:      35,
            history_limit:       50,
            undo_limit:          50,
            squads_per_clan:     3,
            units_per_squad:     4,
            engage_range:        3,
            far_edge_margin:     2,
            fight_roll_pct:      30,
            backward_roll_pct:   20,
            forward_roll_pct:    60,
            enemy_near_roll_pct: 10,
            in_danger_roll_pct:  10,
        }
    }
}

impl BattleConfig {
    /// Load from a JSON file. Out-of-range values are clamped, not rejected.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: BattleConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config.normalized())
    }

    /// Small, fully deterministic configuration used by tests.
    pub fn default_test() -> Self {
        Self {
            field: FieldConfig { width: 20, height: 10 },
            hit_chance_pct: 50,
            squads_per_clan: 2,
            units_per_squad: 3,
            ..Self::default()
        }
    }

    pub fn with_hit_chance(mut self, pct: u32) -> Self {
        self.hit_chance_pct = pct.min(100);
        self
    }

    /// Clamp every numeric field into its valid domain.
    pub fn normalized(mut self) -> Self {
        self.field.width = self.field.width.max(1);
        self.field.height = self.field.height.max(1);
        self.hit_chance_pct = self.hit_chance_pct.min(100);
        self.history_limit = self.history_limit.max(1);
        self.undo_limit = self.undo_limit.max(1);
        self.squads_per_clan = self.squads_per_clan.max(1);
        self.units_per_squad = self.units_per_squad.max(1);
        self.engage_range = self.engage_range.max(0);
        self.far_edge_margin = self.far_edge_margin.max(0);
        self.fight_roll_pct = self.fight_roll_pct.min(100);
        self.backward_roll_pct = self.backward_roll_pct.min(100);
        self.forward_roll_pct = self.forward_roll_pct.min(100);
        self.enemy_near_roll_pct = self.enemy_near_roll_pct.min(100);
        self.in_danger_roll_pct = self.in_danger_roll_pct.min(100);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_x_stays_inside_field() {
        let field = FieldConfig { width: 10, height: 5 };
        assert_eq!(field.clamp_x(-3), 0);
        assert_eq!(field.clamp_x(4), 4);
        assert_eq!(field.clamp_x(10), 9);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: BattleConfig =
            serde_json::from_str(r#"{ "hit_chance_pct": 250 }"#).unwrap();
        let config = config.normalized();
        assert_eq!(config.hit_chance_pct, 100);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.field, FieldConfig::default());
    }

    #[test]
    fn normalized_clamps_degenerate_field() {
        let mut config = BattleConfig::default();
        config.field.width = 0;
        config.units_per_squad = 0;
        let config = config.normalized();
        assert_eq!(config.field.width, 1);
        assert_eq!(config.units_per_squad, 1);
    }
}
