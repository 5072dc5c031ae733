//! Per-game resolution session.
//!
//! A session owns the game's single random source and its combat log.
//! Attacks are resolved one at a time against the current state of the
//! roster, and each outcome is applied before the next attack starts, so
//! casualties inflicted early in a phase are visible to later attacks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, CombatantId};
use crate::config::RulesConfig;
use crate::dice::{RandomSource, SeededDice};
use crate::error::{ContractViolation, ResolutionError, Result};
use crate::handler::{AttackHandler, AttackInputs};
use crate::log::{CombatLog, CombatLogSink};
use crate::outcome::{AttackEffect, AttackOutcome};
use crate::profile::{WeaponCatalog, WeaponId};
use crate::targeting::ToHitContext;

/// An attack as declared by a player or script.
///
/// # Example RON
///
/// ```ron
/// AttackDeclaration(
///     attacker: 1,
///     target: 2,
///     weapon: "auto_rifle",
///     distance: Some(4),
///     to_hit: Some(ToHitContext(side_table: Front)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackDeclaration {
    /// Firing combatant.
    pub attacker: CombatantId,
    /// Target combatant.
    pub target: CombatantId,
    /// Weapon fired.
    pub weapon: WeaponId,
    /// Range band of the shot; 0 is point-blank.
    #[serde(default)]
    pub range_band: u8,
    /// Hexes to the target. When set, the band comes from the weapon's
    /// range increment and `range_band` is ignored.
    #[serde(default)]
    pub distance: Option<u32>,
    /// Targeting result; an attack without one is rejected.
    #[serde(default)]
    pub to_hit: Option<ToHitContext>,
}

impl AttackDeclaration {
    /// Declare a point-blank attack with default targeting.
    #[must_use]
    pub fn new(attacker: CombatantId, target: CombatantId, weapon: impl Into<WeaponId>) -> Self {
        Self {
            attacker,
            target,
            weapon: weapon.into(),
            range_band: 0,
            distance: None,
            to_hit: Some(ToHitContext::default()),
        }
    }

    /// Builder method to set the range band.
    #[must_use]
    pub fn at_range_band(mut self, range_band: u8) -> Self {
        self.range_band = range_band;
        self
    }

    /// Builder method to set the distance to the target in hexes.
    #[must_use]
    pub fn at_distance(mut self, distance: u32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Builder method to set the targeting result.
    #[must_use]
    pub fn with_to_hit(mut self, to_hit: Option<ToHitContext>) -> Self {
        self.to_hit = to_hit;
        self
    }
}

/// Combatants taking part in a game, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    combatants: BTreeMap<CombatantId, Combatant>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a combatant.
    pub fn insert(&mut self, combatant: Combatant) {
        self.combatants.insert(combatant.id, combatant);
    }

    /// Look up a combatant.
    #[must_use]
    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    /// Look up a combatant for mutation.
    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    /// Number of combatants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Iterate combatants in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }
}

impl FromIterator<Combatant> for Roster {
    fn from_iter<I: IntoIterator<Item = Combatant>>(iter: I) -> Self {
        let mut roster = Self::new();
        for combatant in iter {
            roster.insert(combatant);
        }
        roster
    }
}

/// Commits an attack outcome to the target's state.
pub trait DamageApplier {
    /// Apply `outcome` to `target`.
    fn apply(&mut self, target: &mut Combatant, outcome: &AttackOutcome);
}

/// Applies trooper casualties and heat.
///
/// Damage to an infantry target removes one trooper per point. Heat is
/// added to the target's external heat. Structural damage to anything
/// else is left to the caller's own damage allocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CasualtyApplier;

impl DamageApplier for CasualtyApplier {
    fn apply(&mut self, target: &mut Combatant, outcome: &AttackOutcome) {
        match outcome.effect {
            AttackEffect::Structural { to_target, .. } if target.is_infantry() => {
                let casualties = i32::try_from(to_target).unwrap_or(i32::MAX);
                target.shooting_strength =
                    target.shooting_strength.saturating_sub(casualties).max(0);
                tracing::debug!(
                    target = target.id,
                    casualties,
                    remaining = target.shooting_strength,
                    "Troopers lost"
                );
            }
            AttackEffect::Heat(delta) => {
                delta.apply(target);
            }
            AttackEffect::Structural { .. }
            | AttackEffect::PartialCover { .. }
            | AttackEffect::None => {}
        }
    }
}

/// Result of resolving a list of declarations in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseReport {
    /// Outcomes of the attacks that resolved, in declaration order.
    pub outcomes: Vec<AttackOutcome>,
    /// Attacks that were rejected, in declaration order.
    pub failures: Vec<ResolutionError>,
}

/// Resolution session for one game.
#[derive(Debug, Clone)]
pub struct CombatSession<R = SeededDice, L = CombatLog> {
    rng: R,
    log: L,
    rules: RulesConfig,
    resolved: u64,
}

impl CombatSession {
    /// Session with seeded dice and an in-memory log.
    #[must_use]
    pub fn seeded(seed: u64, rules: RulesConfig) -> Self {
        Self::new(SeededDice::new(seed), CombatLog::new(), rules)
    }
}

impl<R: RandomSource, L: CombatLogSink> CombatSession<R, L> {
    /// Create a session from its random source, log sink and rules.
    pub const fn new(rng: R, log: L, rules: RulesConfig) -> Self {
        Self {
            rng,
            log,
            rules,
            resolved: 0,
        }
    }

    /// Session rules.
    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// The session's random source.
    #[must_use]
    pub const fn rng(&self) -> &R {
        &self.rng
    }

    /// The session's log sink.
    #[must_use]
    pub const fn log(&self) -> &L {
        &self.log
    }

    /// Number of attacks resolved successfully.
    #[must_use]
    pub const fn resolved(&self) -> u64 {
        self.resolved
    }

    /// Give back the random source and log.
    pub fn into_parts(self) -> (R, L) {
        (self.rng, self.log)
    }

    /// Resolve one attack from already gathered inputs.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the inputs are missing or
    /// inconsistent; the random stream and log are left untouched.
    pub fn resolve(&mut self, inputs: AttackInputs<'_>) -> Result<AttackOutcome> {
        let outcome =
            AttackHandler::new(inputs, self.rules)?.resolve(&mut self.rng, &mut self.log)?;
        self.resolved += 1;
        Ok(outcome)
    }

    /// Look up a declaration's combatants and weapon, then resolve it.
    ///
    /// # Errors
    ///
    /// Returns a contract violation for an unknown combatant or weapon, or
    /// any violation raised by the handler.
    pub fn resolve_declared<C: WeaponCatalog + ?Sized>(
        &mut self,
        declaration: &AttackDeclaration,
        roster: &Roster,
        catalog: &C,
    ) -> Result<AttackOutcome> {
        let reject = |violation| {
            ResolutionError::contract(
                declaration.attacker,
                declaration.target,
                &declaration.weapon,
                violation,
            )
        };

        let attacker = roster
            .get(declaration.attacker)
            .ok_or_else(|| reject(ContractViolation::UnknownCombatant(declaration.attacker)))?;
        let target = roster
            .get(declaration.target)
            .ok_or_else(|| reject(ContractViolation::UnknownCombatant(declaration.target)))?;
        let profile = catalog
            .attack_profile(&declaration.weapon)
            .ok_or_else(|| reject(ContractViolation::UnknownWeapon))?;
        let profile = match declaration.distance {
            Some(distance) => profile.at_distance(distance),
            None => profile.at_range_band(declaration.range_band),
        };

        self.resolve(AttackInputs {
            weapon: &declaration.weapon,
            attacker,
            target,
            profile: Some(&profile),
            to_hit: declaration.to_hit.as_ref(),
        })
    }

    /// Resolve declarations in order, applying each outcome before the next.
    ///
    /// A rejected declaration is recorded in the report and skipped; the
    /// remaining declarations still resolve.
    pub fn resolve_phase<C, A>(
        &mut self,
        declarations: &[AttackDeclaration],
        roster: &mut Roster,
        catalog: &C,
        applier: &mut A,
    ) -> PhaseReport
    where
        C: WeaponCatalog + ?Sized,
        A: DamageApplier + ?Sized,
    {
        let mut report = PhaseReport::default();

        for declaration in declarations {
            match self.resolve_declared(declaration, roster, catalog) {
                Ok(outcome) => {
                    if let Some(target) = roster.get_mut(outcome.target) {
                        applier.apply(target, &outcome);
                    }
                    report.outcomes.push(outcome);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Attack rejected");
                    report.failures.push(err);
                }
            }
        }

        tracing::info!(
            resolved = report.outcomes.len(),
            rejected = report.failures.len(),
            "Phase resolved"
        );
        report
    }
}
