//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through BattleRng instances derived
//! from the single master seed stored on the session.
//!
//! Each slot gets its own stream, seeded from
//! (master_seed XOR slot_index * golden ratio). Clan generation
//! therefore never shifts the combat stream.
//!
//! A stream counts its draws. `(seed, slot, draws)` fully describes
//! its position, which is what checkpoints store.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG stream.
#[derive(Clone, Debug)]
pub struct BattleRng {
    pub name: &'static str,
    seed:  u64,
    slot:  RngSlot,
    draws: u64,
    inner: Pcg64Mcg,
}

impl BattleRng {
    pub fn new(master_seed: u64, slot: RngSlot) -> Self {
        let derived_seed = master_seed ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name:  slot.name(),
            seed:  master_seed,
            slot,
            draws: 0,
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Rebuild a stream positioned after `draws` draws.
    pub fn resume(master_seed: u64, slot: RngSlot, draws: u64) -> Self {
        let mut rng = Self::new(master_seed, slot);
        for _ in 0..draws {
            rng.next_u64();
        }
        rng
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn slot(&self) -> RngSlot {
        self.slot
    }

    /// Number of values drawn since the stream was seeded.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.next_u64() % n
    }

    /// Uniform integer in [0, 100).
    pub fn roll_percent(&mut self) -> u32 {
        self.next_u64_below(100) as u32
    }

    /// True when a percent roll lands below `pct`.
    pub fn chance_pct(&mut self, pct: u32) -> bool {
        self.roll_percent() < pct
    }

    /// Pick an element of a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let index = self.next_u64_below(items.len() as u64) as usize;
        &items[index]
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries; only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    Battle = 0,
    Generation = 1,
    Checkpoint = 2,
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Battle => "battle",
            Self::Generation => "generation",
            Self::Checkpoint => "checkpoint",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = BattleRng::new(7, RngSlot::Battle);
        let mut b = BattleRng::new(7, RngSlot::Battle);
        let xs: Vec<u32> = (0..32).map(|_| a.roll_percent()).collect();
        let ys: Vec<u32> = (0..32).map(|_| b.roll_percent()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn slots_are_independent_streams() {
        let mut battle = BattleRng::new(7, RngSlot::Battle);
        let mut generation = BattleRng::new(7, RngSlot::Generation);
        let xs: Vec<u64> = (0..8).map(|_| battle.next_u64()).collect();
        let ys: Vec<u64> = (0..8).map(|_| generation.next_u64()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn resume_continues_where_the_stream_left_off() {
        let mut original = BattleRng::new(99, RngSlot::Battle);
        for _ in 0..17 {
            original.roll_percent();
        }
        let mut resumed = BattleRng::resume(99, RngSlot::Battle, original.draws());
        assert_eq!(resumed.draws(), 17);
        for _ in 0..16 {
            assert_eq!(original.next_u64(), resumed.next_u64());
        }
    }

    #[test]
    fn roll_percent_in_range() {
        let mut rng = BattleRng::new(1, RngSlot::Battle);
        for _ in 0..1000 {
            assert!(rng.roll_percent() < 100);
        }
        assert!(!rng.chance_pct(0));
        assert!(rng.chance_pct(100));
    }
}
