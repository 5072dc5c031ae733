//! Attack handler state machine.
//!
//! One [`AttackHandler`] resolves exactly one declared attack:
//!
//! ```text
//! Declared -> HitsComputed -> DamagePerHitComputed -> DamageApplied -> Logged -> Done
//! ```
//!
//! Phases only move forward. All inputs are validated when the handler is
//! built, before the first die is drawn, and log entries are buffered
//! until the `Logged` transition, so a rejected attack never touches the
//! session's random stream or log.
//!
//! Which damage-application routine runs is decided once, up front, by
//! [`ResolutionVariant::select`].

use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;
use crate::config::RulesConfig;
use crate::dice::RandomSource;
use crate::error::{ContractViolation, ResolutionError, Result};
use crate::heat::{resolve_heat_transfer, HeatResolution};
use crate::log::{messages, CombatLogEntry, CombatLogSink};
use crate::math::{hundredths, round_damage, Fixed};
use crate::outcome::{AttackEffect, AttackOutcome, DamageType};
use crate::profile::{AttackProfile, DamageClass, WeaponId};
use crate::targeting::{HitLocation, ToHitContext};

/// Damage per hit added by muscle implants at point-blank range.
#[must_use]
pub fn muscle_implant_bonus() -> Fixed {
    hundredths(14)
}

/// Damage one hit carries, or `None` if the implant bonus overflows.
fn per_hit_damage(attacker: &Combatant, profile: &AttackProfile) -> Option<Fixed> {
    let per_hit = if attacker.is_conventional_infantry() {
        attacker.damage_per_trooper.unwrap_or(Fixed::ZERO)
    } else {
        profile.base_damage_per_target
    };
    if profile.is_point_blank() && attacker.muscle_implant {
        per_hit.checked_add(muscle_implant_bonus())
    } else {
        Some(per_hit)
    }
}

/// Largest total `hits` hits of `per_hit` can reach, burst die included.
fn damage_ceiling(per_hit: Fixed, hits: u32) -> Option<u32> {
    let raw = per_hit.checked_mul(Fixed::checked_from_num(hits)?)?;
    round_damage(raw).checked_add(6)
}

/// Phase of an [`AttackHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandlerPhase {
    /// Inputs validated, nothing rolled yet.
    Declared,
    /// Hit count known.
    HitsComputed,
    /// Damage per hit known.
    DamagePerHitComputed,
    /// Damage (or heat) computed and its effect decided.
    DamageApplied,
    /// Entries flushed to the log sink.
    Logged,
    /// Outcome handed to the caller.
    Done,
}

/// Damage-application routine for an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionVariant {
    /// Damage reduces armor or structure.
    Standard,
    /// Damage is converted to heat on a heat-tracking target.
    Heat,
}

impl ResolutionVariant {
    /// Pick the variant for a weapon class, target and session rules.
    #[must_use]
    pub fn select(damage_class: DamageClass, target: &Combatant, rules: &RulesConfig) -> Self {
        match (
            damage_class.generates_heat(),
            target.is_heat_tracking(),
            rules.heat_rules,
        ) {
            (true, true, true) => Self::Heat,
            _ => Self::Standard,
        }
    }
}

/// Borrowed inputs of one declared attack.
///
/// Profile and to-hit context are optional here because they come from
/// external collaborators; the handler refuses to run without them.
#[derive(Debug, Clone, Copy)]
pub struct AttackInputs<'a> {
    /// Declared weapon.
    pub weapon: &'a WeaponId,
    /// Firing combatant.
    pub attacker: &'a Combatant,
    /// Target combatant.
    pub target: &'a Combatant,
    /// Catalog profile for the weapon.
    pub profile: Option<&'a AttackProfile>,
    /// Targeting result.
    pub to_hit: Option<&'a ToHitContext>,
}

/// Breakdown of the damage computation for one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageCalculation {
    /// `round(damage_per_hit * hits)`.
    pub base: u32,
    /// Extra d6 rolled by a burst weapon against troopers.
    pub burst_bonus: u32,
    /// Damage before mechanized halving, when halving applied.
    pub before_halving: Option<u32>,
    /// Non-penetrating weapon stopped by a structure.
    pub blocked_by_structure: bool,
    /// Final damage.
    pub total: u32,
}

/// Single-use resolver for one attack.
#[derive(Debug)]
pub struct AttackHandler<'a> {
    weapon: &'a WeaponId,
    attacker: &'a Combatant,
    target: &'a Combatant,
    profile: &'a AttackProfile,
    to_hit: &'a ToHitContext,
    rules: RulesConfig,
    variant: ResolutionVariant,
    phase: HandlerPhase,
    shooting_strength: u32,
    hits: u32,
    damage_per_hit: Fixed,
    damage: u32,
    damage_type: DamageType,
    effect: AttackEffect,
    secondary: Vec<CombatLogEntry>,
    emitted: Vec<CombatLogEntry>,
}

impl<'a> AttackHandler<'a> {
    /// Validate the inputs and build a handler with the selected variant.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the profile or to-hit context is
    /// missing, or if the attacker's data is inconsistent.
    pub fn new(inputs: AttackInputs<'a>, rules: RulesConfig) -> Result<Self> {
        let profile = inputs.profile.ok_or_else(|| {
            Self::violation(&inputs, ContractViolation::MissingProfile)
        })?;
        let variant = ResolutionVariant::select(profile.damage_class, inputs.target, &rules);
        Self::with_variant(inputs, rules, variant)
    }

    /// Build a handler for an explicitly requested variant.
    ///
    /// Requesting the heat variant while heat rules are off, or against a
    /// target that does not track heat, falls back to the standard variant.
    ///
    /// # Errors
    ///
    /// Same as [`AttackHandler::new`].
    pub fn with_variant(
        inputs: AttackInputs<'a>,
        rules: RulesConfig,
        requested: ResolutionVariant,
    ) -> Result<Self> {
        let profile = inputs.profile.ok_or_else(|| {
            Self::violation(&inputs, ContractViolation::MissingProfile)
        })?;
        let to_hit = inputs
            .to_hit
            .ok_or_else(|| Self::violation(&inputs, ContractViolation::MissingToHit))?;
        profile
            .validate()
            .map_err(|violation| Self::violation(&inputs, violation))?;
        let shooting_strength = inputs
            .attacker
            .effective_shooting_strength()
            .map_err(|violation| Self::violation(&inputs, violation))?;

        if inputs.attacker.is_conventional_infantry() {
            match inputs.attacker.damage_per_trooper {
                None => {
                    return Err(Self::violation(
                        &inputs,
                        ContractViolation::MissingDamagePerTrooper,
                    ))
                }
                Some(damage) if damage < Fixed::ZERO => {
                    return Err(Self::violation(
                        &inputs,
                        ContractViolation::NegativeDamage(damage),
                    ))
                }
                Some(_) => {}
            }
        }

        let in_range = per_hit_damage(inputs.attacker, profile)
            .and_then(|per_hit| damage_ceiling(per_hit, shooting_strength))
            .is_some();
        if !in_range {
            return Err(Self::violation(&inputs, ContractViolation::DamageOverflow));
        }

        let variant = match requested {
            ResolutionVariant::Heat if !rules.heat_rules => {
                tracing::warn!(
                    attacker = inputs.attacker.id,
                    target = inputs.target.id,
                    weapon = %inputs.weapon,
                    "Heat resolution requested with heat rules disabled; using standard damage"
                );
                ResolutionVariant::Standard
            }
            ResolutionVariant::Heat if !inputs.target.is_heat_tracking() => {
                tracing::debug!(
                    target = inputs.target.id,
                    "Target does not track heat; using standard damage"
                );
                ResolutionVariant::Standard
            }
            other => other,
        };

        tracing::debug!(
            attacker = inputs.attacker.id,
            target = inputs.target.id,
            weapon = %inputs.weapon,
            ?variant,
            "Attack declared"
        );

        Ok(Self {
            weapon: inputs.weapon,
            attacker: inputs.attacker,
            target: inputs.target,
            profile,
            to_hit,
            rules,
            variant,
            phase: HandlerPhase::Declared,
            shooting_strength,
            hits: 0,
            damage_per_hit: Fixed::ZERO,
            damage: 0,
            damage_type: DamageType::Normal,
            effect: AttackEffect::None,
            secondary: Vec::new(),
            emitted: Vec::new(),
        })
    }

    fn violation(inputs: &AttackInputs<'_>, violation: ContractViolation) -> ResolutionError {
        ResolutionError::contract(inputs.attacker.id, inputs.target.id, inputs.weapon, violation)
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> HandlerPhase {
        self.phase
    }

    /// Selected damage-application variant.
    #[must_use]
    pub const fn variant(&self) -> ResolutionVariant {
        self.variant
    }

    /// Hit count (zero before [`compute_hits`](Self::compute_hits)).
    #[must_use]
    pub const fn hits(&self) -> u32 {
        self.hits
    }

    /// Damage per hit (zero before [`compute_damage_per_hit`](Self::compute_damage_per_hit)).
    #[must_use]
    pub const fn damage_per_hit(&self) -> Fixed {
        self.damage_per_hit
    }

    fn fail(&self, violation: ContractViolation) -> ResolutionError {
        ResolutionError::contract(self.attacker.id, self.target.id, self.weapon, violation)
    }

    fn expect_phase(&self, expected: HandlerPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(self.fail(ContractViolation::PhaseOrder {
                expected,
                actual: self.phase,
            }))
        }
    }

    fn advance(&mut self, next: HandlerPhase) {
        tracing::trace!(from = ?self.phase, to = ?next, "handler phase");
        self.phase = next;
    }

    /// Determine how many members of the attacking group strike.
    ///
    /// A swarming attacker always lands its full shooting strength. Anyone
    /// else rolls on the cluster table.
    ///
    /// # Errors
    ///
    /// Returns a phase-order violation unless the handler is `Declared`.
    pub fn compute_hits<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Result<u32> {
        self.expect_phase(HandlerPhase::Declared)?;

        let hits = if self.attacker.is_swarming(self.target.id) {
            self.shooting_strength
        } else {
            let glancing = self.to_hit.glancing && self.rules.glancing_blows;
            rng.roll_cluster_hits(self.shooting_strength, self.to_hit.modifiers, glancing)
                .min(self.shooting_strength)
        };

        tracing::debug!(
            attacker = self.attacker.id,
            strength = self.shooting_strength,
            hits,
            "Hits computed"
        );
        self.hits = hits;
        self.advance(HandlerPhase::HitsComputed);
        Ok(hits)
    }

    /// Determine the damage each hit carries.
    ///
    /// Conventional infantry use their aggregate damage per trooper rather
    /// than the declared weapon's figure. Muscle implants add a flat bonus
    /// at point-blank range. A miss carries no damage.
    ///
    /// # Errors
    ///
    /// Returns a phase-order violation unless hits have just been computed.
    pub fn compute_damage_per_hit(&mut self) -> Result<Fixed> {
        self.expect_phase(HandlerPhase::HitsComputed)?;

        let per_hit = if self.hits == 0 {
            Fixed::ZERO
        } else {
            per_hit_damage(self.attacker, self.profile)
                .ok_or_else(|| self.fail(ContractViolation::DamageOverflow))?
        };

        self.damage_per_hit = per_hit;
        self.advance(HandlerPhase::DamagePerHitComputed);
        Ok(per_hit)
    }

    /// Compose the damage of `hits` hits of `damage_per_hit` each.
    ///
    /// Applies, in order: the burst die against burst-vulnerable targets,
    /// mechanized halving, and the non-penetrating block against
    /// structures. Zero hits return zero without rolling.
    ///
    /// # Errors
    ///
    /// Returns a damage-overflow violation if the total leaves the
    /// fixed-point range. The check runs before the burst die is drawn.
    pub fn calc_damage_dealt<R: RandomSource + ?Sized>(
        &self,
        hits: u32,
        damage_per_hit: Fixed,
        rng: &mut R,
    ) -> Result<DamageCalculation> {
        if hits == 0 {
            return Ok(DamageCalculation::default());
        }

        let overflow = || self.fail(ContractViolation::DamageOverflow);
        damage_ceiling(damage_per_hit, hits).ok_or_else(overflow)?;
        let raw = Fixed::checked_from_num(hits)
            .and_then(|hits| damage_per_hit.checked_mul(hits))
            .ok_or_else(overflow)?;
        let base = round_damage(raw);
        let mut calc = DamageCalculation {
            base,
            total: base,
            ..DamageCalculation::default()
        };

        if self.target.is_burst_vulnerable() && self.profile.is_burst() {
            calc.burst_bonus = u32::from(rng.roll_d6());
            calc.total = calc.total.checked_add(calc.burst_bonus).ok_or_else(overflow)?;
        }

        if self.target.is_mechanized() {
            calc.before_halving = Some(calc.total);
            calc.total /= 2;
        }

        if self.target.is_structure() && self.profile.is_non_penetrating() {
            calc.blocked_by_structure = true;
            calc.total = 0;
        }

        tracing::trace!(?calc, "damage composed");
        Ok(calc)
    }

    /// Compute the attack's damage and decide its effect on the target.
    ///
    /// # Errors
    ///
    /// Returns a phase-order violation unless damage per hit is known.
    pub fn apply_damage<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.expect_phase(HandlerPhase::DamagePerHitComputed)?;

        let calc = self.calc_damage_dealt(self.hits, self.damage_per_hit, rng)?;
        self.damage = calc.total;
        self.record_modifiers(&calc);

        if calc.blocked_by_structure {
            self.damage_type = DamageType::NonPenetrating;
            self.effect = AttackEffect::None;
        } else if self.damage == 0 {
            self.effect = AttackEffect::None;
        } else {
            match self.variant {
                ResolutionVariant::Standard => self.apply_structural(),
                ResolutionVariant::Heat => self.apply_heat(rng),
            }
        }

        tracing::debug!(
            attacker = self.attacker.id,
            target = self.target.id,
            damage = self.damage,
            damage_type = ?self.damage_type,
            "Damage applied"
        );
        self.advance(HandlerPhase::DamageApplied);
        Ok(())
    }

    fn record_modifiers(&mut self, calc: &DamageCalculation) {
        if calc.burst_bonus > 0 {
            self.secondary.push(
                CombatLogEntry::new(messages::BURST_BONUS, self.target.id)
                    .with_int(calc.burst_bonus)
                    .indented(1),
            );
        }
        if let Some(before) = calc.before_halving {
            self.secondary.push(
                CombatLogEntry::new(messages::MECHANIZED_HALVED, self.target.id)
                    .with_int(calc.total)
                    .with_int(before)
                    .indented(1),
            );
        }
        if calc.blocked_by_structure {
            self.secondary.push(
                CombatLogEntry::new(messages::NON_PENETRATING, self.target.id)
                    .with_text(self.weapon.as_str())
                    .indented(1),
            );
        }
    }

    fn apply_structural(&mut self) {
        let absorbed = if self.rules.building_absorption {
            self.target.building_absorption.min(self.damage)
        } else {
            0
        };
        if absorbed > 0 {
            self.secondary.push(
                CombatLogEntry::new(messages::BUILDING_ABSORBS, self.target.id)
                    .with_int(absorbed)
                    .indented(1),
            );
        }
        self.effect = AttackEffect::Structural {
            to_target: self.damage - absorbed,
            absorbed_by_building: absorbed,
        };
    }

    fn apply_heat<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        match resolve_heat_transfer(self.target, self.to_hit, self.damage, rng) {
            HeatResolution::Covered { location } => self.partial_cover_hit(location),
            HeatResolution::Transferred {
                delta,
                dissipated_by,
                ..
            } => {
                let entry = match dissipated_by {
                    Some(armor) => CombatLogEntry::new(messages::HEAT_DISSIPATED, self.target.id)
                        .with_int(delta.amount)
                        .with_text(armor.name()),
                    None => CombatLogEntry::new(messages::HEAT_APPLIED, self.target.id)
                        .with_int(delta.amount),
                };
                self.secondary.push(entry.indented(1));
                self.damage_type = DamageType::Heat;
                self.effect = AttackEffect::Heat(delta);
            }
        }
    }

    /// The shot struck cover at `location`; nothing reaches the target.
    fn partial_cover_hit(&mut self, location: HitLocation) {
        self.secondary.push(
            CombatLogEntry::new(messages::PARTIAL_COVER, self.target.id)
                .with_text(location.describe())
                .indented(1),
        );
        self.effect = AttackEffect::PartialCover { location };
    }

    /// Flush the primary entry and any secondary entries to `sink`.
    ///
    /// # Errors
    ///
    /// Returns a phase-order violation unless damage has been applied.
    pub fn write_log<L: CombatLogSink + ?Sized>(&mut self, sink: &mut L) -> Result<()> {
        self.expect_phase(HandlerPhase::DamageApplied)?;

        let primary = CombatLogEntry::new(messages::TROOPERS_HIT, self.attacker.id)
            .with_int(self.hits)
            .with_text(self.to_hit.table_description())
            .with_int(self.damage);

        self.emitted.push(primary);
        self.emitted.append(&mut self.secondary);
        for entry in &self.emitted {
            sink.append(entry.clone());
        }

        self.advance(HandlerPhase::Logged);
        Ok(())
    }

    /// Hand the outcome to the caller.
    ///
    /// # Errors
    ///
    /// Returns a phase-order violation unless the log has been written.
    pub fn finish(&mut self) -> Result<AttackOutcome> {
        self.expect_phase(HandlerPhase::Logged)?;

        #[cfg(feature = "debug-validation")]
        self.check_invariants();

        self.advance(HandlerPhase::Done);
        Ok(AttackOutcome {
            attacker: self.attacker.id,
            target: self.target.id,
            weapon: self.weapon.clone(),
            hit_count: self.hits,
            damage_dealt: self.damage,
            damage_type: self.damage_type,
            effect: self.effect,
            log: std::mem::take(&mut self.emitted),
        })
    }

    #[cfg(feature = "debug-validation")]
    fn check_invariants(&self) {
        if self.attacker.is_swarming(self.target.id) {
            assert_eq!(self.hits, self.shooting_strength, "swarm must saturate");
        } else {
            assert!(self.hits <= self.shooting_strength, "hits exceed strength");
        }
        if self.target.is_structure() && self.profile.is_non_penetrating() {
            assert_eq!(self.damage, 0, "non-penetrating damage reached a structure");
        }
    }

    /// Run every phase in order.
    ///
    /// # Errors
    ///
    /// Returns a phase-order violation if any step was already run by hand.
    pub fn resolve<R, L>(mut self, rng: &mut R, sink: &mut L) -> Result<AttackOutcome>
    where
        R: RandomSource + ?Sized,
        L: CombatLogSink + ?Sized,
    {
        if self.phase == HandlerPhase::Declared {
            self.compute_hits(rng)?;
        }
        if self.phase == HandlerPhase::HitsComputed {
            self.compute_damage_per_hit()?;
        }
        if self.phase == HandlerPhase::DamagePerHitComputed {
            self.apply_damage(rng)?;
        }
        if self.phase == HandlerPhase::DamageApplied {
            self.write_log(sink)?;
        }
        self.finish()
    }
}

/// Resolve one attack from declaration to outcome.
///
/// # Errors
///
/// Returns a contract violation if the inputs are missing or inconsistent;
/// in that case nothing is rolled and nothing is logged.
pub fn resolve<R, L>(
    inputs: AttackInputs<'_>,
    rules: RulesConfig,
    rng: &mut R,
    sink: &mut L,
) -> Result<AttackOutcome>
where
    R: RandomSource + ?Sized,
    L: CombatLogSink + ?Sized,
{
    AttackHandler::new(inputs, rules)?.resolve(rng, sink)
}
