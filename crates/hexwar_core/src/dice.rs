//! Dice for attack resolution.
//!
//! Every random decision in the engine goes through a [`RandomSource`]
//! handed to the resolution call. A game session owns exactly one
//! source, so a session seed reproduces every roll of a replay.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cluster::resolve_cluster;

/// Source of dice rolls for one game session.
///
/// Implementations must be deterministic for a fixed seed. Only
/// [`roll_d6`](RandomSource::roll_d6) is required; multi-die sums and the
/// cluster lookup are built on top of it and can be overridden by
/// scripted sources in tests.
pub trait RandomSource {
    /// Roll one six-sided die (1-6 inclusive).
    fn roll_d6(&mut self) -> u8;

    /// Roll two six-sided dice and sum them (2-12 inclusive).
    fn roll_2d6(&mut self) -> u8 {
        self.roll_d6() + self.roll_d6()
    }

    /// Number of members of a group of `size` that strike.
    ///
    /// `modifier` shifts the 2d6 cluster roll; `glancing` applies the
    /// glancing-blow penalty on top of it.
    fn roll_cluster_hits(&mut self, size: u32, modifier: i32, glancing: bool) -> u32 {
        resolve_cluster(size, modifier, glancing, || self.roll_2d6())
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn roll_d6(&mut self) -> u8 {
        (**self).roll_d6()
    }

    fn roll_2d6(&mut self) -> u8 {
        (**self).roll_2d6()
    }

    fn roll_cluster_hits(&mut self, size: u32, modifier: i32, glancing: bool) -> u32 {
        (**self).roll_cluster_hits(size, modifier, glancing)
    }
}

/// Seeded dice backed by ChaCha8.
#[derive(Debug, Clone)]
pub struct SeededDice {
    seed: u64,
    rng: ChaCha8Rng,
    rolls: u64,
}

impl SeededDice {
    /// Create dice from a session seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            rolls: 0,
        }
    }

    /// Seed the dice were created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of single dice rolled so far.
    #[must_use]
    pub const fn rolls(&self) -> u64 {
        self.rolls
    }
}

impl RandomSource for SeededDice {
    fn roll_d6(&mut self) -> u8 {
        self.rolls += 1;
        self.rng.gen_range(1..=6)
    }
}
