//! End-to-end attack resolution tests.
//!
//! Scripted dice pin every roll so the expected numbers can be read off
//! the rules directly; seeded sessions check reproducibility.

use hexwar_core::combatant::ArmorKind;
use hexwar_core::handler::{AttackInputs, ResolutionVariant};
use hexwar_core::log::{messages, MessageCatalog};
use hexwar_core::prelude::*;
use hexwar_core::session::CasualtyApplier;
use hexwar_core::targeting::CoverState;
use hexwar_test_utils::determinism::{compute_hash, strategies, PhaseFixture};
use hexwar_test_utils::fixtures::{
    battle_armor_point, bunker, mechanized_squad, rifle_squad, sample_catalog, war_machine,
    ScriptedDice,
};
use proptest::prelude::*;

fn inputs<'a>(
    weapon: &'a WeaponId,
    attacker: &'a Combatant,
    target: &'a Combatant,
    profile: &'a AttackProfile,
    to_hit: &'a ToHitContext,
) -> AttackInputs<'a> {
    AttackInputs {
        weapon,
        attacker,
        target,
        profile: Some(profile),
        to_hit: Some(to_hit),
    }
}

fn profile(weapon: &str) -> AttackProfile {
    sample_catalog()
        .attack_profile(&WeaponId::new(weapon))
        .expect("weapon in sample catalog")
}

// =============================================================================
// Scenarios
// =============================================================================

mod scenarios {
    use super::*;

    /// Six troopers, four hit, half a point each.
    #[test]
    fn test_squad_damage_scales_with_hits() {
        let weapon = WeaponId::new("rifle");
        let rifle = profile("rifle");
        let to_hit = ToHitContext::default();
        let attacker = rifle_squad(1, 6);
        let target = rifle_squad(2, 10);
        let mut dice = ScriptedDice::new().with_cluster_hits(&[4]);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &rifle, &to_hit),
            RulesConfig::default(),
            &mut dice,
            &mut log,
        )
        .unwrap();

        assert_eq!(outcome.hit_count, 4);
        assert_eq!(outcome.damage_dealt, 2);
        assert_eq!(outcome.damage_type, DamageType::Normal);
        dice.assert_exhausted();
    }

    #[test]
    fn test_mechanized_target_halves_damage() {
        let weapon = WeaponId::new("rifle");
        let rifle = profile("rifle");
        let to_hit = ToHitContext::default();
        let attacker = rifle_squad(1, 6);
        let target = mechanized_squad(2, 10);
        let mut dice = ScriptedDice::new().with_cluster_hits(&[4]);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &rifle, &to_hit),
            RulesConfig::default(),
            &mut dice,
            &mut log,
        )
        .unwrap();

        assert_eq!(outcome.damage_dealt, 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[1].message_id, messages::MECHANIZED_HALVED);
    }

    #[test]
    fn test_burst_adds_a_die_against_troopers() {
        let weapon = WeaponId::new("smg");
        let smg = profile("smg");
        let to_hit = ToHitContext::default();
        let attacker = rifle_squad(1, 6);
        let target = rifle_squad(2, 10);
        let mut dice = ScriptedDice::new().with_cluster_hits(&[6]).with_d6(&[4]);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &smg, &to_hit),
            RulesConfig::default(),
            &mut dice,
            &mut log,
        )
        .unwrap();

        assert_eq!(outcome.damage_dealt, 7);
        assert_eq!(log.entries()[1].message_id, messages::BURST_BONUS);
        dice.assert_exhausted();
    }

    #[test]
    fn test_burst_ignores_battle_armor() {
        let weapon = WeaponId::new("smg");
        let smg = profile("smg");
        let to_hit = ToHitContext::default();
        let attacker = rifle_squad(1, 6);
        let target = battle_armor_point(2, 4);
        // No d6 scripted: a burst roll would panic.
        let mut dice = ScriptedDice::new().with_cluster_hits(&[6]);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &smg, &to_hit),
            RulesConfig::default(),
            &mut dice,
            &mut log,
        )
        .unwrap();
        assert_eq!(outcome.damage_dealt, 3);
    }

    #[test]
    fn test_heat_dissipating_armor_halves_heat() {
        let weapon = WeaponId::new("flamer");
        let flamer = profile("flamer");
        let to_hit = ToHitContext::default();
        let attacker = battle_armor_point(1, 5);
        let target = war_machine(2, ArmorKind::HeatDissipating);
        // Five suits all hit for 2 each; 7 on the location roll is the center torso.
        let mut dice = ScriptedDice::new().with_cluster_hits(&[5]).with_2d6(&[7]);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &flamer, &to_hit),
            RulesConfig::default().with_heat_rules(true),
            &mut dice,
            &mut log,
        )
        .unwrap();

        assert_eq!(outcome.damage_dealt, 10);
        assert_eq!(outcome.damage_type, DamageType::Heat);
        assert_eq!(outcome.structural_damage(), 0);
        assert_eq!(
            outcome.heat_delta(),
            Some(HeatDelta {
                target: 2,
                amount: 5,
            })
        );
        assert_eq!(
            MessageCatalog::render(&log.entries()[1]),
            "  Target gains 5 heat (halved by Heat-Dissipating armor)."
        );
        dice.assert_exhausted();
    }

    #[test]
    fn test_swarm_lands_every_member() {
        let weapon = WeaponId::new("launcher");
        let launcher = profile("launcher");
        let to_hit = ToHitContext {
            glancing: true,
            modifiers: -6,
            ..ToHitContext::default()
        };
        let target = war_machine(2, ArmorKind::Standard);
        let attacker = battle_armor_point(1, 8).swarming(target.id);
        let mut dice = ScriptedDice::new();
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &launcher, &to_hit),
            RulesConfig::default(),
            &mut dice,
            &mut log,
        )
        .unwrap();

        assert_eq!(outcome.hit_count, 8);
        assert_eq!(dice.drawn(), 0);
    }
}

// =============================================================================
// Edge cases
// =============================================================================

mod edge_cases {
    use super::*;

    #[test]
    fn test_non_penetrating_cannot_harm_structures() {
        let weapon = WeaponId::new("stunner");
        let stunner = profile("stunner");
        let to_hit = ToHitContext::default();
        let attacker = rifle_squad(1, 6);
        let target = bunker(2);
        let mut dice = ScriptedDice::new().with_cluster_hits(&[5]);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &stunner, &to_hit),
            RulesConfig::default(),
            &mut dice,
            &mut log,
        )
        .unwrap();

        assert_eq!(outcome.damage_dealt, 0);
        assert_eq!(outcome.damage_type, DamageType::NonPenetrating);
        assert_eq!(outcome.effect, AttackEffect::None);
        assert_eq!(
            MessageCatalog::render(&log.entries()[1]),
            "  stunner cannot damage the structure."
        );
    }

    #[test]
    fn test_heat_attack_into_partial_cover() {
        let weapon = WeaponId::new("flamer");
        let flamer = profile("flamer");
        let to_hit = ToHitContext {
            cover: CoverState::Partial,
            ..ToHitContext::default()
        };
        let attacker = battle_armor_point(1, 3);
        let target = war_machine(2, ArmorKind::Standard);
        // 5 from the front is the right leg.
        let mut dice = ScriptedDice::new().with_cluster_hits(&[3]).with_2d6(&[5]);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &flamer, &to_hit),
            RulesConfig::default().with_heat_rules(true),
            &mut dice,
            &mut log,
        )
        .unwrap();

        assert!(matches!(outcome.effect, AttackEffect::PartialCover { .. }));
        assert!(outcome.heat_delta().is_none());
        assert_eq!(outcome.structural_damage(), 0);
        assert_eq!(
            MessageCatalog::render(&log.entries()[1]),
            "  Shot at RL strikes cover."
        );

        // The computed damage is reported, but applying the outcome changes nothing.
        assert_eq!(outcome.damage_dealt, 6);
        let mut applied = target.clone();
        CasualtyApplier.apply(&mut applied, &outcome);
        assert_eq!(applied, target);
    }

    #[test]
    fn test_heat_weapon_against_infantry_does_damage() {
        let weapon = WeaponId::new("flamer");
        let flamer = profile("flamer");
        let to_hit = ToHitContext::default();
        let attacker = battle_armor_point(1, 2);
        let target = rifle_squad(2, 10);
        let mut dice = ScriptedDice::new().with_cluster_hits(&[2]);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &flamer, &to_hit),
            RulesConfig::default().with_heat_rules(true),
            &mut dice,
            &mut log,
        )
        .unwrap();
        assert_eq!(outcome.structural_damage(), 4);
        assert_eq!(outcome.damage_type, DamageType::Normal);
    }

    #[test]
    fn test_failed_attack_leaves_stream_and_log_untouched() {
        let mut session = CombatSession::seeded(99, RulesConfig::default());
        let roster: Roster = [rifle_squad(1, 6), rifle_squad(2, 6)].into_iter().collect();
        let catalog = sample_catalog();

        session
            .resolve_declared(&AttackDeclaration::new(1, 2, "rifle"), &roster, &catalog)
            .unwrap();
        let log_len = session.log().len();
        let rolls = session.rng().rolls();

        let missing = AttackDeclaration::new(1, 2, "rifle").with_to_hit(None);
        let err = session
            .resolve_declared(&missing, &roster, &catalog)
            .unwrap_err();
        assert_eq!(err.violation(), Some(&ContractViolation::MissingToHit));
        assert!(err.to_string().contains("rifle"));
        assert_eq!(session.log().len(), log_len);
        assert_eq!(session.rng().rolls(), rolls);
    }

    #[test]
    fn test_variant_is_fixed_before_resolution() {
        let target = war_machine(2, ArmorKind::Standard);
        let rules = RulesConfig::default().with_heat_rules(true);
        assert_eq!(
            ResolutionVariant::select(profile("flamer").damage_class, &target, &rules),
            ResolutionVariant::Heat
        );
        assert_eq!(
            ResolutionVariant::select(profile("rifle").damage_class, &target, &rules),
            ResolutionVariant::Standard
        );
    }
}

// =============================================================================
// Sessions
// =============================================================================

mod sessions {
    use super::*;

    #[test]
    fn test_casualties_visible_to_later_attacks() {
        let catalog = sample_catalog();
        let mut roster: Roster = [rifle_squad(1, 20), rifle_squad(2, 6)].into_iter().collect();
        let mut session = CombatSession::new(
            ScriptedDice::new().with_cluster_hits(&[20, 0]),
            CombatLog::new(),
            RulesConfig::default(),
        );

        // First volley: 20 hits at 0.5 wipes out all six troopers of squad 2.
        let report = session.resolve_phase(
            &[
                AttackDeclaration::new(1, 2, "rifle"),
                AttackDeclaration::new(2, 1, "rifle"),
            ],
            &mut roster,
            &catalog,
            &mut CasualtyApplier,
        );

        assert!(report.failures.is_empty());
        assert_eq!(roster.get(2).unwrap().shooting_strength, 0);
        assert_eq!(report.outcomes[1].hit_count, 0);
        assert_eq!(roster.get(1).unwrap().shooting_strength, 20);
    }

    #[test]
    fn test_heat_is_committed_by_the_applier() {
        let catalog = sample_catalog();
        let mut roster: Roster = [battle_armor_point(1, 4), war_machine(2, ArmorKind::Standard)]
            .into_iter()
            .collect();
        let mut session = CombatSession::new(
            ScriptedDice::new().with_cluster_hits(&[4]).with_2d6(&[7]),
            CombatLog::new(),
            RulesConfig::default().with_heat_rules(true),
        );

        let report = session.resolve_phase(
            &[AttackDeclaration::new(1, 2, "flamer")],
            &mut roster,
            &catalog,
            &mut CasualtyApplier,
        );

        assert_eq!(report.outcomes[0].heat_delta().map(|d| d.amount), Some(8));
        assert_eq!(roster.get(2).unwrap().external_heat, 8);
    }

    #[test]
    fn test_same_seed_same_outcomes() {
        let fixture = PhaseFixture {
            seed: 2024,
            rules: RulesConfig::default().with_heat_rules(true),
            roster: [
                rifle_squad(1, 28),
                mechanized_squad(2, 21),
                battle_armor_point(3, 5),
                war_machine(4, ArmorKind::HeatDissipating),
            ]
            .into_iter()
            .collect(),
            catalog: sample_catalog(),
            declarations: vec![
                AttackDeclaration::new(1, 2, "smg"),
                AttackDeclaration::new(2, 1, "rifle"),
                AttackDeclaration::new(3, 4, "flamer"),
                AttackDeclaration::new(1, 3, "rifle").at_range_band(1),
            ],
        };

        let run = |fixture: &PhaseFixture| {
            let mut roster = fixture.roster.clone();
            let mut session = CombatSession::seeded(fixture.seed, fixture.rules);
            let report = session.resolve_phase(
                &fixture.declarations,
                &mut roster,
                &fixture.catalog,
                &mut CasualtyApplier,
            );
            (compute_hash(&report.outcomes), session.log().state_hash())
        };

        assert_eq!(run(&fixture), run(&fixture));
        assert_eq!(fixture.run(), fixture.run());
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_swarm_always_lands_full_strength(
        strength in strategies::arb_shooting_strength(),
        to_hit in strategies::arb_to_hit(),
        seed in any::<u64>(),
    ) {
        let weapon = WeaponId::new("launcher");
        let launcher = profile("launcher");
        let target = war_machine(2, ArmorKind::Standard);
        let attacker = battle_armor_point(1, strength).swarming(target.id);
        let mut dice = SeededDice::new(seed);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &launcher, &to_hit),
            RulesConfig::default(),
            &mut dice,
            &mut log,
        ).unwrap();
        prop_assert_eq!(i64::from(outcome.hit_count), i64::from(strength));
    }

    #[test]
    fn prop_hits_bounded_by_strength(
        attacker in strategies::arb_infantry_attacker(),
        target in strategies::arb_target(),
        profile in strategies::arb_profile(),
        to_hit in strategies::arb_to_hit(),
        seed in any::<u64>(),
    ) {
        let weapon = profile.weapon.clone();
        let mut dice = SeededDice::new(seed);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &profile, &to_hit),
            RulesConfig::default().with_heat_rules(true),
            &mut dice,
            &mut log,
        ).unwrap();
        prop_assert!(i64::from(outcome.hit_count) <= i64::from(attacker.shooting_strength));
        prop_assert_eq!(log.entries()[0].message_id, messages::TROOPERS_HIT);
        prop_assert_eq!(&outcome.log, log.entries());
    }

    #[test]
    fn prop_non_penetrating_never_damages_structures(
        attacker in strategies::arb_infantry_attacker(),
        damage in strategies::arb_damage(),
        seed in any::<u64>(),
    ) {
        let weapon = WeaponId::new("stunner");
        let stunner = AttackProfile::new("stunner", damage)
            .with_flags(WeaponFlags::NON_PENETRATING | WeaponFlags::BURST);
        let to_hit = ToHitContext::default();
        let target = bunker(2);
        let mut dice = SeededDice::new(seed);
        let mut log = CombatLog::new();

        let outcome = resolve(
            inputs(&weapon, &attacker, &target, &stunner, &to_hit),
            RulesConfig::default(),
            &mut dice,
            &mut log,
        ).unwrap();
        prop_assert_eq!(outcome.damage_dealt, 0);
        if outcome.hit_count > 0 {
            prop_assert_eq!(outcome.damage_type, DamageType::NonPenetrating);
        }
    }

    #[test]
    fn prop_mechanized_takes_half(
        strength in 1i32..=30,
        hits in 0u32..=30,
        damage in strategies::arb_damage(),
    ) {
        let hits = hits.min(strength.unsigned_abs());
        let weapon = WeaponId::new("rifle");
        let rifle = AttackProfile::new("rifle", damage);
        let to_hit = ToHitContext::default();
        let attacker = Combatant::infantry(1, "Squad", strength, damage);
        let open = rifle_squad(2, 10);
        let mechanized = mechanized_squad(3, 10);

        let mut log = CombatLog::new();
        let raw = resolve(
            inputs(&weapon, &attacker, &open, &rifle, &to_hit),
            RulesConfig::default(),
            &mut ScriptedDice::new().with_cluster_hits(&[hits]),
            &mut log,
        ).unwrap();
        let halved = resolve(
            inputs(&weapon, &attacker, &mechanized, &rifle, &to_hit),
            RulesConfig::default(),
            &mut ScriptedDice::new().with_cluster_hits(&[hits]),
            &mut log,
        ).unwrap();
        prop_assert_eq!(halved.damage_dealt, raw.damage_dealt / 2);
    }

    #[test]
    fn prop_identical_seeds_identical_logs(
        attacker in strategies::arb_infantry_attacker(),
        target in strategies::arb_target(),
        profile in strategies::arb_profile(),
        to_hit in strategies::arb_to_hit(),
        seed in any::<u64>(),
    ) {
        let weapon = profile.weapon.clone();
        let rules = RulesConfig::default().with_heat_rules(true);
        let mut first_log = CombatLog::new();
        let mut second_log = CombatLog::new();

        let first = resolve(
            inputs(&weapon, &attacker, &target, &profile, &to_hit),
            rules,
            &mut SeededDice::new(seed),
            &mut first_log,
        ).unwrap();
        let second = resolve(
            inputs(&weapon, &attacker, &target, &profile, &to_hit),
            rules,
            &mut SeededDice::new(seed),
            &mut second_log,
        ).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(first_log.state_hash(), second_log.state_hash());
    }
}
