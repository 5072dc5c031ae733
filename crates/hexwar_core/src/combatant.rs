//! Capability-tagged combatants.
//!
//! The engine never asks what concrete kind of unit it is looking at; it
//! queries [`Capabilities`] flags and the few derived values resolution
//! needs (shooting strength, damage per trooper, armor at a location).

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::ContractViolation;
use crate::math::{option_decimal_serde, Fixed};
use crate::targeting::{HitLocation, Location};

/// Unique identifier for combatants.
pub type CombatantId = u32;

bitflags! {
    /// What a combatant is, as far as resolution rules care.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Capabilities: u8 {
        /// Fights as a squad of troopers.
        const INFANTRY      = 1 << 0;
        /// Infantry riding a support vehicle.
        const MECHANIZED    = 1 << 1;
        /// Powered-armor infantry.
        const BATTLE_ARMOR  = 1 << 2;
        /// Building or other unoccupied structure.
        const STRUCTURE     = 1 << 3;
        /// Tracks heat and can be overheated by external sources.
        const HEAT_TRACKING = 1 << 4;
    }
}

/// Armor construction at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArmorKind {
    /// Plain armor plate.
    #[default]
    Standard,
    /// Sheds half of any externally applied heat.
    HeatDissipating,
    /// Spalls away against explosive hits.
    Reactive,
    /// Mirrors part of energy weapon fire.
    Reflective,
}

impl ArmorKind {
    /// Whether this armor halves heat transferred through it.
    #[must_use]
    pub const fn dissipates_heat(self) -> bool {
        matches!(self, Self::HeatDissipating)
    }

    /// Display name for the combat log.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::HeatDissipating => "Heat-Dissipating",
            Self::Reactive => "Reactive",
            Self::Reflective => "Reflective",
        }
    }
}

/// Armor at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationArmor {
    /// Armor construction.
    #[serde(default)]
    pub kind: ArmorKind,
    /// Remaining front armor points.
    pub points: u32,
    /// Remaining rear armor points (torso locations only).
    #[serde(default)]
    pub rear_points: u32,
}

impl LocationArmor {
    /// Armor with the same value front and rear.
    #[must_use]
    pub const fn new(kind: ArmorKind, points: u32) -> Self {
        Self {
            kind,
            points,
            rear_points: points,
        }
    }

    /// Points remaining on the struck face.
    #[must_use]
    pub const fn points_for(&self, hit: &HitLocation) -> u32 {
        if hit.rear {
            self.rear_points
        } else {
            self.points
        }
    }
}

/// Attacker or target in a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combatant {
    /// Unique id, used as the subject of log entries.
    pub id: CombatantId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Capability flags.
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Surviving troopers able to fire (infantry only).
    #[serde(default = "default_shooting_strength")]
    pub shooting_strength: i32,
    /// Aggregate damage of one trooper's carried weapons (conventional infantry only).
    #[serde(default, with = "option_decimal_serde")]
    pub damage_per_trooper: Option<Fixed>,
    /// Combatant this unit is physically attached to, if swarming.
    #[serde(default)]
    pub swarming: Option<CombatantId>,
    /// Myomer implants that add punch at point-blank range.
    #[serde(default)]
    pub muscle_implant: bool,
    /// Armor by location (heat-tracking war-machines).
    #[serde(default)]
    pub armor: BTreeMap<Location, LocationArmor>,
    /// Heat accumulated from external sources this turn.
    #[serde(default)]
    pub external_heat: u32,
    /// Absorption of the building this combatant occupies, 0 in the open.
    #[serde(default)]
    pub building_absorption: u32,
}

/// Default shooting strength for single-bodied combatants.
const fn default_shooting_strength() -> i32 {
    1
}

impl Combatant {
    /// A bare combatant with no capabilities.
    #[must_use]
    pub fn new(id: CombatantId, name: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            id,
            name: name.into(),
            capabilities,
            shooting_strength: default_shooting_strength(),
            damage_per_trooper: None,
            swarming: None,
            muscle_implant: false,
            armor: BTreeMap::new(),
            external_heat: 0,
            building_absorption: 0,
        }
    }

    /// A conventional infantry squad.
    #[must_use]
    pub fn infantry(
        id: CombatantId,
        name: impl Into<String>,
        shooting_strength: i32,
        damage_per_trooper: Fixed,
    ) -> Self {
        let mut combatant = Self::new(id, name, Capabilities::INFANTRY);
        combatant.shooting_strength = shooting_strength;
        combatant.damage_per_trooper = Some(damage_per_trooper);
        combatant
    }

    /// A battle-armor squad; its damage comes from the weapon profile.
    #[must_use]
    pub fn battle_armor(id: CombatantId, name: impl Into<String>, shooting_strength: i32) -> Self {
        let mut combatant = Self::new(
            id,
            name,
            Capabilities::INFANTRY | Capabilities::BATTLE_ARMOR,
        );
        combatant.shooting_strength = shooting_strength;
        combatant
    }

    /// A heat-tracking war-machine with standard armor everywhere.
    #[must_use]
    pub fn war_machine(id: CombatantId, name: impl Into<String>, armor_points: u32) -> Self {
        let mut combatant = Self::new(id, name, Capabilities::HEAT_TRACKING);
        for location in [
            Location::Head,
            Location::CenterTorso,
            Location::LeftTorso,
            Location::RightTorso,
            Location::LeftArm,
            Location::RightArm,
            Location::LeftLeg,
            Location::RightLeg,
        ] {
            combatant
                .armor
                .insert(location, LocationArmor::new(ArmorKind::Standard, armor_points));
        }
        combatant
    }

    /// An unoccupied structure.
    #[must_use]
    pub fn structure(id: CombatantId, name: impl Into<String>) -> Self {
        Self::new(id, name, Capabilities::STRUCTURE)
    }

    /// Builder method to add capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    /// Builder method to attach this combatant to a swarm target.
    #[must_use]
    pub fn swarming(mut self, target: CombatantId) -> Self {
        self.swarming = Some(target);
        self
    }

    /// Builder method to enable muscle implants.
    #[must_use]
    pub fn with_muscle_implant(mut self) -> Self {
        self.muscle_implant = true;
        self
    }

    /// Builder method to set armor at every location.
    #[must_use]
    pub fn with_armor_kind(mut self, kind: ArmorKind) -> Self {
        for armor in self.armor.values_mut() {
            armor.kind = kind;
        }
        self
    }

    /// Builder method to set armor at one location.
    #[must_use]
    pub fn with_location_armor(mut self, location: Location, armor: LocationArmor) -> Self {
        self.armor.insert(location, armor);
        self
    }

    /// Builder method to place this combatant inside a building.
    #[must_use]
    pub fn inside_building(mut self, absorption: u32) -> Self {
        self.building_absorption = absorption;
        self
    }

    /// Fights as troopers.
    #[must_use]
    pub fn is_infantry(&self) -> bool {
        self.capabilities.contains(Capabilities::INFANTRY)
    }

    /// Powered-armor infantry.
    #[must_use]
    pub fn is_battle_armor(&self) -> bool {
        self.capabilities.contains(Capabilities::BATTLE_ARMOR)
    }

    /// Infantry that is not battle armor.
    #[must_use]
    pub fn is_conventional_infantry(&self) -> bool {
        self.is_infantry() && !self.is_battle_armor()
    }

    /// Infantry riding a support vehicle.
    #[must_use]
    pub fn is_mechanized(&self) -> bool {
        self.is_infantry() && self.capabilities.contains(Capabilities::MECHANIZED)
    }

    /// Building or structure.
    #[must_use]
    pub fn is_structure(&self) -> bool {
        self.capabilities.contains(Capabilities::STRUCTURE)
    }

    /// Tracks external heat.
    #[must_use]
    pub fn is_heat_tracking(&self) -> bool {
        self.capabilities.contains(Capabilities::HEAT_TRACKING)
    }

    /// Suffers extra damage from burst weapons: troopers without powered armor.
    #[must_use]
    pub fn is_burst_vulnerable(&self) -> bool {
        self.is_conventional_infantry()
    }

    /// Attached to `target` in a swarm attack.
    #[must_use]
    pub fn is_swarming(&self, target: CombatantId) -> bool {
        self.swarming == Some(target)
    }

    /// Number of members firing: troopers for infantry, otherwise one.
    ///
    /// # Errors
    ///
    /// Returns a violation if the recorded shooting strength is negative.
    pub fn effective_shooting_strength(&self) -> Result<u32, ContractViolation> {
        let strength = u32::try_from(self.shooting_strength)
            .map_err(|_| ContractViolation::NegativeShootingStrength(self.shooting_strength))?;
        Ok(if self.is_infantry() { strength } else { 1 })
    }

    /// Armor record for a struck location.
    #[must_use]
    pub fn armor_at(&self, hit: &HitLocation) -> Option<&LocationArmor> {
        self.armor.get(&hit.location)
    }

    /// Display label for diagnostics.
    #[must_use]
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("#{}", self.id)
        } else {
            format!("{} (#{})", self.name, self.id)
        }
    }
}

/// Weapons carried by a conventional infantry squad.
///
/// Squads fire many individual weapons at once, so their damage is the
/// trooper-weighted average of the primary and secondary weapons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfantryLoadout {
    /// Troopers per squad.
    pub squad_size: u32,
    /// Damage per target of the primary weapon.
    pub primary: Fixed,
    /// Damage per target of the secondary weapon and how many troopers carry it.
    pub secondary: Option<(Fixed, u32)>,
}

impl InfantryLoadout {
    /// Aggregate damage one trooper contributes.
    #[must_use]
    pub fn damage_per_trooper(&self) -> Fixed {
        let Some((secondary, carriers)) = self.secondary else {
            return self.primary;
        };
        if self.squad_size == 0 || carriers == 0 {
            return self.primary;
        }

        let carriers = carriers.min(self.squad_size);
        let squad = Fixed::from_num(self.squad_size);
        let primary_share = self
            .primary
            .saturating_mul(Fixed::saturating_from_num(self.squad_size - carriers));
        let secondary_share = secondary.saturating_mul(Fixed::saturating_from_num(carriers));
        primary_share.saturating_add(secondary_share) / squad
    }
}
