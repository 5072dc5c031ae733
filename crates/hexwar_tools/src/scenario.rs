//! Scenario loading and headless resolution.
//!
//! A scenario is a self-contained RON file: session rules, the weapons
//! it uses, the combatants on the field and the attacks declared this
//! phase, in order.

use std::path::Path;

use hexwar_core::combatant::Combatant;
use hexwar_core::config::RulesConfig;
use hexwar_core::data::WeaponData;
use hexwar_core::error::ResolutionError;
use hexwar_core::log::CombatLog;
use hexwar_core::outcome::AttackOutcome;
use hexwar_core::profile::CatalogRegistry;
use hexwar_core::replay::AttackReplay;
use hexwar_core::session::{AttackDeclaration, CasualtyApplier, CombatSession, Roster};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for tool operations.
#[derive(Error, Debug)]
pub enum ToolError {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Failed to produce JSON.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Engine rejected the data.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// A complete scenario.
///
/// # Example RON
///
/// ```ron
/// Scenario(
///     name: "Ambush",
///     rules: (heat_rules: true),
///     weapons: [
///         WeaponData(id: "rifle", name: "Rifle", damage_per_target: 0.5),
///     ],
///     combatants: [
///         Combatant(id: 1, name: "Alpha", capabilities: "INFANTRY", shooting_strength: 7, damage_per_trooper: Some(0.5)),
///         Combatant(id: 2, name: "Bravo", capabilities: "INFANTRY", shooting_strength: 7, damage_per_trooper: Some(0.5)),
///     ],
///     attacks: [
///         AttackDeclaration(attacker: 1, target: 2, weapon: "rifle", to_hit: Some((modifiers: 0))),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Session rules.
    #[serde(default)]
    pub rules: RulesConfig,
    /// Weapon records used by the attacks.
    pub weapons: Vec<WeaponData>,
    /// Combatants on the field.
    pub combatants: Vec<Combatant>,
    /// Attacks in declaration order.
    pub attacks: Vec<AttackDeclaration>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ToolError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ToolError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse.
    pub fn from_ron_str(ron: &str) -> Result<Self, ToolError> {
        let scenario: Self = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Build the weapon catalog.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate or invalid weapons.
    pub fn catalog(&self) -> Result<CatalogRegistry, ToolError> {
        let mut catalog = CatalogRegistry::new();
        for weapon in &self.weapons {
            catalog.insert(weapon.clone())?;
        }
        Ok(catalog)
    }

    /// Starting roster.
    #[must_use]
    pub fn roster(&self) -> Roster {
        self.combatants.iter().cloned().collect()
    }

    /// Resolve every attack in a session seeded with `seed`.
    ///
    /// Rejected attacks are reported in the run, not returned as errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the weapon list is invalid.
    pub fn resolve(&self, seed: u64) -> Result<ScenarioRun, ToolError> {
        let catalog = self.catalog()?;
        let mut roster = self.roster();
        let mut session = CombatSession::seeded(seed, self.rules);

        let report =
            session.resolve_phase(&self.attacks, &mut roster, &catalog, &mut CasualtyApplier);
        let (_, log) = session.into_parts();

        tracing::info!(
            scenario = %self.name,
            seed,
            resolved = report.outcomes.len(),
            rejected = report.failures.len(),
            "Scenario resolved"
        );

        Ok(ScenarioRun {
            scenario: self.name.clone(),
            seed,
            log_hash: log.state_hash(),
            log_lines: log.render().lines().map(str::to_string).collect(),
            outcomes: report.outcomes,
            failures: report.failures.iter().map(ToString::to_string).collect(),
            final_roster: roster.iter().cloned().collect(),
            log,
        })
    }

    /// Record this scenario as a replay for `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the weapon list is invalid.
    pub fn record_replay(&self, seed: u64) -> Result<AttackReplay, ToolError> {
        let catalog = self.catalog()?;
        let mut replay =
            AttackReplay::new(self.name.clone(), seed, self.rules, self.roster(), &catalog);
        for attack in &self.attacks {
            replay.record(attack.clone());
        }
        let (_, log, _) = replay.play()?;
        replay.finalize(log.state_hash());
        Ok(replay)
    }
}

/// Result of resolving a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRun {
    /// Scenario name.
    pub scenario: String,
    /// Session seed.
    pub seed: u64,
    /// Hash of the structured combat log.
    pub log_hash: u64,
    /// Rendered log, one entry per line.
    pub log_lines: Vec<String>,
    /// Outcomes of resolved attacks.
    pub outcomes: Vec<AttackOutcome>,
    /// Rejected attacks.
    pub failures: Vec<String>,
    /// Combatants after all attacks were applied.
    pub final_roster: Vec<Combatant>,
    /// Structured combat log.
    #[serde(skip)]
    pub log: CombatLog,
}

impl ScenarioRun {
    /// Pretty JSON for machine consumers.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_json(&self) -> Result<String, ToolError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMBUSH: &str = r#"
        Scenario(
            name: "Ambush",
            weapons: [
                WeaponData(id: "rifle", name: "Rifle", damage_per_target: 0.5),
            ],
            combatants: [
                Combatant(id: 1, name: "Alpha", capabilities: "INFANTRY", shooting_strength: 12, damage_per_trooper: Some(0.5)),
                Combatant(id: 2, name: "Bravo", capabilities: "INFANTRY | MECHANIZED", shooting_strength: 9, damage_per_trooper: Some(0.5)),
            ],
            attacks: [
                AttackDeclaration(attacker: 1, target: 2, weapon: "rifle", to_hit: Some((modifiers: 0))),
                AttackDeclaration(attacker: 2, target: 1, weapon: "rifle", range_band: 1, to_hit: Some((glancing: true))),
                AttackDeclaration(attacker: 1, target: 2, weapon: "plasma", to_hit: Some((modifiers: 0))),
            ],
        )
    "#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_ron_str(AMBUSH).unwrap();
        assert_eq!(scenario.name, "Ambush");
        assert_eq!(scenario.combatants.len(), 2);
        assert!(scenario.combatants[1].is_mechanized());
        assert!(!scenario.rules.heat_rules);
    }

    #[test]
    fn test_resolve_reports_rejections() {
        let run = Scenario::from_ron_str(AMBUSH).unwrap().resolve(3).unwrap();
        assert_eq!(run.outcomes.len(), 2);
        assert_eq!(run.failures.len(), 1);
        assert!(run.failures[0].contains("plasma"));
        assert_eq!(run.log_lines.len(), run.log.len());
    }

    #[test]
    fn test_same_seed_same_run() {
        let scenario = Scenario::from_ron_str(AMBUSH).unwrap();
        let first = scenario.resolve(17).unwrap();
        let second = scenario.resolve(17).unwrap();
        assert_eq!(first.log_hash, second.log_hash);
        assert_eq!(first.outcomes, second.outcomes);
    }

    #[test]
    fn test_recorded_replay_verifies() {
        let scenario = Scenario::from_ron_str(AMBUSH).unwrap();
        let replay = scenario.record_replay(17).unwrap();
        assert_eq!(replay.final_log_hash, scenario.resolve(17).unwrap().log_hash);
        assert!(replay.verify().unwrap());
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::load("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ToolError::FileNotFound(_)));
    }
}
