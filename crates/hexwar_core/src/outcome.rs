//! Result records of a resolved attack.

use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, CombatantId};
use crate::log::CombatLogEntry;
use crate::profile::WeaponId;
use crate::targeting::HitLocation;

/// How the dealt damage is to be interpreted downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamageType {
    /// Ordinary damage to armor or structure.
    #[default]
    Normal,
    /// Non-penetrating weapon that could not harm a structure.
    NonPenetrating,
    /// Damage delivered entirely as heat.
    Heat,
}

/// Heat to add to a target's external heat accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeatDelta {
    /// Combatant receiving the heat.
    pub target: CombatantId,
    /// Heat points.
    pub amount: u32,
}

impl HeatDelta {
    /// Commit the heat to `target`.
    ///
    /// Returns `false` and leaves the combatant untouched if it is not the
    /// combatant this delta was computed for.
    pub fn apply(&self, target: &mut Combatant) -> bool {
        if target.id != self.target {
            tracing::warn!(
                expected = self.target,
                actual = target.id,
                "Heat delta applied to the wrong combatant"
            );
            return false;
        }
        target.external_heat = target.external_heat.saturating_add(self.amount);
        true
    }
}

/// Effect the attack has on the board, for the damage-application step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackEffect {
    /// Nothing landed.
    #[default]
    None,
    /// Damage to the target's armor or structure.
    Structural {
        /// Points reaching the target.
        to_target: u32,
        /// Points soaked by the building the target occupies.
        absorbed_by_building: u32,
    },
    /// Damage converted entirely into heat.
    Heat(HeatDelta),
    /// The shot struck cover at the rolled location.
    PartialCover {
        /// Location that was screened.
        location: HitLocation,
    },
}

/// Outcome of one resolved attack. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Attacking combatant.
    pub attacker: CombatantId,
    /// Target combatant.
    pub target: CombatantId,
    /// Weapon fired.
    pub weapon: WeaponId,
    /// Members of the attacking group that struck.
    pub hit_count: u32,
    /// Damage computed for the attack, before it is applied.
    ///
    /// Not necessarily what reaches the target: a shot into partial cover
    /// still reports its full damage here. Appliers act on [`effect`](Self::effect).
    pub damage_dealt: u32,
    /// How the damage is interpreted.
    pub damage_type: DamageType,
    /// What reaches the board.
    pub effect: AttackEffect,
    /// Entries this attack appended to the session log.
    pub log: Vec<CombatLogEntry>,
}

impl AttackOutcome {
    /// Whether nothing struck the target.
    #[must_use]
    pub const fn is_miss(&self) -> bool {
        self.hit_count == 0
    }

    /// Points of armor or structure damage the target takes.
    #[must_use]
    pub const fn structural_damage(&self) -> u32 {
        match self.effect {
            AttackEffect::Structural { to_target, .. } => to_target,
            _ => 0,
        }
    }

    /// Heat the target takes, if the attack was converted to heat.
    #[must_use]
    pub const fn heat_delta(&self) -> Option<HeatDelta> {
        match self.effect {
            AttackEffect::Heat(delta) => Some(delta),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(effect: AttackEffect) -> AttackOutcome {
        AttackOutcome {
            attacker: 1,
            target: 2,
            weapon: WeaponId::new("flamer"),
            hit_count: 3,
            damage_dealt: 6,
            damage_type: DamageType::Heat,
            effect,
            log: Vec::new(),
        }
    }

    #[test]
    fn test_heat_outcome_has_no_structural_damage() {
        let heat = outcome(AttackEffect::Heat(HeatDelta {
            target: 2,
            amount: 6,
        }));
        assert_eq!(heat.structural_damage(), 0);
        assert_eq!(heat.heat_delta().map(|d| d.amount), Some(6));
    }

    #[test]
    fn test_structural_outcome() {
        let hit = outcome(AttackEffect::Structural {
            to_target: 4,
            absorbed_by_building: 2,
        });
        assert_eq!(hit.structural_damage(), 4);
        assert!(hit.heat_delta().is_none());
        assert!(!hit.is_miss());
    }

    #[test]
    fn test_heat_delta_applies_to_matching_target_only() {
        let delta = HeatDelta {
            target: 2,
            amount: 5,
        };
        let mut target = Combatant::war_machine(2, "Warhammer", 10);
        let mut bystander = Combatant::war_machine(3, "Rifleman", 10);

        assert!(delta.apply(&mut target));
        assert!(delta.apply(&mut target));
        assert_eq!(target.external_heat, 10);

        assert!(!delta.apply(&mut bystander));
        assert_eq!(bystander.external_heat, 0);
    }
}
