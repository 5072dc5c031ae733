//! Test fixtures and helpers.
//!
//! Scripted dice, stock combatants and a small weapon catalog for
//! consistent testing.

use std::collections::VecDeque;

use fixed::types::I32F32;
use hexwar_core::cluster::resolve_cluster;
use hexwar_core::combatant::{ArmorKind, Capabilities, Combatant, CombatantId};
use hexwar_core::data::WeaponData;
use hexwar_core::dice::RandomSource;
use hexwar_core::math::hundredths;
use hexwar_core::profile::{CatalogRegistry, DamageClass, WeaponFlags};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Dice that replay a fixed script.
///
/// Queued 2d6 and cluster results are used first; without them the
/// roll falls back to summing scripted d6 results. Running out of
/// script panics: a test that draws more dice than it scripted is
/// exercising a path it did not mean to.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    d6: VecDeque<u8>,
    two_d6: VecDeque<u8>,
    cluster: VecDeque<u32>,
    drawn: usize,
}

impl ScriptedDice {
    /// Dice with an empty script; any roll panics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue single d6 results.
    #[must_use]
    pub fn with_d6(mut self, rolls: &[u8]) -> Self {
        self.d6.extend(rolls);
        self
    }

    /// Builder method to queue 2d6 sums.
    #[must_use]
    pub fn with_2d6(mut self, rolls: &[u8]) -> Self {
        self.two_d6.extend(rolls);
        self
    }

    /// Builder method to queue cluster results (hits landed).
    #[must_use]
    pub fn with_cluster_hits(mut self, hits: &[u32]) -> Self {
        self.cluster.extend(hits);
        self
    }

    /// Number of scripted results consumed so far.
    #[must_use]
    pub const fn drawn(&self) -> usize {
        self.drawn
    }

    /// Number of scripted results left.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.d6.len() + self.two_d6.len() + self.cluster.len()
    }

    /// Assert that every scripted result was used.
    ///
    /// # Panics
    ///
    /// Panics if part of the script is left over.
    pub fn assert_exhausted(&self) {
        assert_eq!(
            self.remaining(),
            0,
            "scripted dice left unused: d6 {:?}, 2d6 {:?}, cluster {:?}",
            self.d6,
            self.two_d6,
            self.cluster
        );
    }
}

impl RandomSource for ScriptedDice {
    fn roll_d6(&mut self) -> u8 {
        let Some(roll) = self.d6.pop_front() else {
            panic!("scripted dice exhausted: d6 requested after {} draws", self.drawn);
        };
        self.drawn += 1;
        tracing::trace!(roll, "scripted d6");
        roll
    }

    fn roll_2d6(&mut self) -> u8 {
        match self.two_d6.pop_front() {
            Some(roll) => {
                self.drawn += 1;
                tracing::trace!(roll, "scripted 2d6");
                roll
            }
            None => self.roll_d6() + self.roll_d6(),
        }
    }

    fn roll_cluster_hits(&mut self, size: u32, modifier: i32, glancing: bool) -> u32 {
        match self.cluster.pop_front() {
            Some(hits) => {
                self.drawn += 1;
                tracing::trace!(size, hits, "scripted cluster");
                hits
            }
            None => resolve_cluster(size, modifier, glancing, || self.roll_2d6()),
        }
    }
}

/// Conventional rifle squad at 0.5 damage per trooper.
#[must_use]
pub fn rifle_squad(id: CombatantId, troopers: i32) -> Combatant {
    Combatant::infantry(id, "Rifle Squad", troopers, hundredths(50))
}

/// Mechanized rifle squad.
#[must_use]
pub fn mechanized_squad(id: CombatantId, troopers: i32) -> Combatant {
    rifle_squad(id, troopers).with_capabilities(Capabilities::MECHANIZED)
}

/// Battle-armor point.
#[must_use]
pub fn battle_armor_point(id: CombatantId, suits: i32) -> Combatant {
    Combatant::battle_armor(id, "Battle Armor", suits)
}

/// Heat-tracking war-machine with the given armor everywhere.
#[must_use]
pub fn war_machine(id: CombatantId, armor: ArmorKind) -> Combatant {
    Combatant::war_machine(id, "War Machine", 20).with_armor_kind(armor)
}

/// Unoccupied structure.
#[must_use]
pub fn bunker(id: CombatantId) -> Combatant {
    Combatant::structure(id, "Bunker")
}

/// Small catalog covering every weapon behavior the engine knows.
///
/// | id         | damage | flags           | class |
/// |------------|--------|-----------------|-------|
/// | `rifle`    | 0.5    |                 |       |
/// | `smg`      | 0.5    | BURST           |       |
/// | `stunner`  | 1.0    | NON_PENETRATING |       |
/// | `flamer`   | 2.0    | SUPPORT         | Heat  |
/// | `launcher` | 2.0    |                 |       |
#[must_use]
pub fn sample_catalog() -> CatalogRegistry {
    let weapons = [
        WeaponData::new("rifle", "Rifle", hundredths(50)).with_range_increment(3),
        WeaponData::new("smg", "Submachine Gun", hundredths(50)).with_flags(WeaponFlags::BURST),
        WeaponData::new("stunner", "Stun Baton", fixed(1)).with_flags(WeaponFlags::NON_PENETRATING),
        WeaponData::new("flamer", "Flamer", fixed(2))
            .with_flags(WeaponFlags::SUPPORT)
            .with_damage_class(DamageClass::Heat),
        WeaponData::new("launcher", "Missile Launcher", fixed(2)).with_range_increment(4),
    ];

    let mut catalog = CatalogRegistry::new();
    for weapon in weapons {
        if let Err(err) = catalog.insert(weapon) {
            panic!("sample catalog is invalid: {err}");
        }
    }
    catalog
}
