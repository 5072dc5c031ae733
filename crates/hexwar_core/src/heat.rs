//! Heat transfer against heat-tracking targets.
//!
//! Heat weapons fired under heat rules do no structural damage. The
//! target takes the attack's damage as external heat instead, halved if
//! the struck location carries intact heat-dissipating armor. The attack
//! rolls its own hit location; a location screened by partial cover
//! takes nothing.

use crate::combatant::{ArmorKind, Combatant};
use crate::dice::RandomSource;
use crate::outcome::HeatDelta;
use crate::targeting::{roll_hit_location, HitLocation, ToHitContext};

/// What a heat attack did once its location was rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatResolution {
    /// Cover stopped the shot.
    Covered {
        /// Screened location.
        location: HitLocation,
    },
    /// Heat reached the target.
    Transferred {
        /// Heat to add.
        delta: HeatDelta,
        /// Armor that halved the heat, if any.
        dissipated_by: Option<ArmorKind>,
        /// Struck location.
        location: HitLocation,
    },
}

/// Heat left after passing through `armor` on the struck face.
#[must_use]
pub fn transferred_heat(damage: u32, armor: Option<ArmorKind>) -> u32 {
    match armor {
        Some(kind) if kind.dissipates_heat() => damage / 2,
        _ => damage,
    }
}

/// Roll a location for a heat attack of `damage` points and work out the heat.
///
/// Consumes exactly one hit-location roll.
pub fn resolve_heat_transfer<R: RandomSource + ?Sized>(
    target: &Combatant,
    to_hit: &ToHitContext,
    damage: u32,
    rng: &mut R,
) -> HeatResolution {
    let location = roll_hit_location(rng, to_hit.hit_table, to_hit.side_table);

    if to_hit.cover.shields(location.location) {
        tracing::debug!(
            target = target.id,
            location = %location.describe(),
            "Heat attack strikes cover"
        );
        return HeatResolution::Covered { location };
    }

    // Stripped armor no longer sheds heat.
    let dissipated_by = target
        .armor_at(&location)
        .filter(|armor| armor.points_for(&location) > 0 && armor.kind.dissipates_heat())
        .map(|armor| armor.kind);

    let delta = HeatDelta {
        target: target.id,
        amount: transferred_heat(damage, dissipated_by),
    };
    tracing::debug!(
        target = target.id,
        location = %location.describe(),
        heat = delta.amount,
        "Heat transferred"
    );
    HeatResolution::Transferred {
        delta,
        dissipated_by,
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::LocationArmor;
    use crate::targeting::{CoverState, Location};

    /// Always rolls a 7 on 2d6 (center torso from the front).
    struct Sevens;

    impl RandomSource for Sevens {
        fn roll_d6(&mut self) -> u8 {
            unreachable!("heat attacks roll 2d6 on the normal table")
        }

        fn roll_2d6(&mut self) -> u8 {
            7
        }
    }

    /// Always rolls a 5 on 2d6 (right leg from the front).
    struct Fives;

    impl RandomSource for Fives {
        fn roll_d6(&mut self) -> u8 {
            unreachable!("heat attacks roll 2d6 on the normal table")
        }

        fn roll_2d6(&mut self) -> u8 {
            5
        }
    }

    #[test]
    fn test_full_heat_through_standard_armor() {
        let target = Combatant::war_machine(7, "Warhammer", 20);
        let result = resolve_heat_transfer(&target, &ToHitContext::default(), 9, &mut Sevens);
        match result {
            HeatResolution::Transferred {
                delta,
                dissipated_by,
                location,
            } => {
                assert_eq!(delta, HeatDelta { target: 7, amount: 9 });
                assert_eq!(dissipated_by, None);
                assert_eq!(location.location, Location::CenterTorso);
            }
            HeatResolution::Covered { .. } => panic!("no cover declared"),
        }
    }

    #[test]
    fn test_heat_dissipating_armor_halves() {
        let target = Combatant::war_machine(7, "Warhammer", 20)
            .with_armor_kind(ArmorKind::HeatDissipating);
        let result = resolve_heat_transfer(&target, &ToHitContext::default(), 9, &mut Sevens);
        let HeatResolution::Transferred {
            delta,
            dissipated_by,
            ..
        } = result
        else {
            panic!("no cover declared");
        };
        assert_eq!(delta.amount, 4);
        assert_eq!(dissipated_by, Some(ArmorKind::HeatDissipating));
    }

    #[test]
    fn test_stripped_dissipating_armor_does_not_halve() {
        let target = Combatant::war_machine(7, "Warhammer", 20).with_location_armor(
            Location::CenterTorso,
            LocationArmor::new(ArmorKind::HeatDissipating, 0),
        );
        let result = resolve_heat_transfer(&target, &ToHitContext::default(), 8, &mut Sevens);
        let HeatResolution::Transferred { delta, .. } = result else {
            panic!("no cover declared");
        };
        assert_eq!(delta.amount, 8);
    }

    #[test]
    fn test_partial_cover_screens_legs_only() {
        let target = Combatant::war_machine(7, "Warhammer", 20);
        let covered = ToHitContext {
            cover: CoverState::Partial,
            ..ToHitContext::default()
        };

        let legs = resolve_heat_transfer(&target, &covered, 8, &mut Fives);
        assert_eq!(
            legs,
            HeatResolution::Covered {
                location: HitLocation {
                    location: Location::RightLeg,
                    rear: false,
                },
            }
        );

        let torso = resolve_heat_transfer(&target, &covered, 8, &mut Sevens);
        assert!(matches!(torso, HeatResolution::Transferred { .. }));
    }

    #[test]
    fn test_transferred_heat() {
        assert_eq!(transferred_heat(10, None), 10);
        assert_eq!(transferred_heat(10, Some(ArmorKind::Standard)), 10);
        assert_eq!(transferred_heat(11, Some(ArmorKind::HeatDissipating)), 5);
    }
}
