//! Recording and verifying resolved attack phases.
//!
//! A replay stores everything a session needs to resolve the same attacks
//! again: the seed, the rules, the starting roster, the weapon records and
//! the declarations in order. Replaying re-runs them through a fresh seeded
//! session and compares the hash of the resulting combat log.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::data::WeaponData;
use crate::error::{ResolutionError, Result};
use crate::log::CombatLog;
use crate::profile::CatalogRegistry;
use crate::session::{AttackDeclaration, CasualtyApplier, CombatSession, PhaseReport, Roster};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Recorded attack phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackReplay {
    /// Replay format version.
    pub version: u32,
    /// Scenario identifier or name.
    pub scenario_id: String,
    /// Seed of the session's dice.
    pub seed: u64,
    /// Session rules.
    pub rules: RulesConfig,
    /// Roster before the first attack.
    pub roster: Roster,
    /// Weapon records referenced by the declarations.
    pub weapons: Vec<WeaponData>,
    /// Declarations in resolution order.
    pub declarations: Vec<AttackDeclaration>,
    /// Hash of the combat log after the last declaration.
    pub final_log_hash: u64,
}

impl AttackReplay {
    /// Start recording a phase from its initial state.
    pub fn new(
        scenario_id: impl Into<String>,
        seed: u64,
        rules: RulesConfig,
        roster: Roster,
        catalog: &CatalogRegistry,
    ) -> Self {
        Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            seed,
            rules,
            roster,
            weapons: catalog.iter().cloned().collect(),
            declarations: Vec::new(),
            final_log_hash: 0,
        }
    }

    /// Record a declaration.
    pub fn record(&mut self, declaration: AttackDeclaration) {
        self.declarations.push(declaration);
    }

    /// Finalize the replay with the log hash of the recorded session.
    pub fn finalize(&mut self, final_log_hash: u64) {
        self.final_log_hash = final_log_hash;
    }

    /// Number of recorded declarations.
    #[must_use]
    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| ResolutionError::Replay(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| ResolutionError::Replay(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading, deserialization or the version check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| ResolutionError::Replay(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| ResolutionError::Replay(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(ResolutionError::Replay(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }

    /// Rebuild the weapon catalog.
    ///
    /// # Errors
    /// Returns an error if the stored records are inconsistent.
    pub fn catalog(&self) -> Result<CatalogRegistry> {
        let mut catalog = CatalogRegistry::new();
        for weapon in &self.weapons {
            catalog.insert(weapon.clone())?;
        }
        Ok(catalog)
    }

    /// Resolve the recorded declarations again from the initial state.
    ///
    /// # Errors
    /// Returns an error if the catalog cannot be rebuilt.
    pub fn play(&self) -> Result<(PhaseReport, CombatLog, Roster)> {
        let catalog = self.catalog()?;
        let mut roster = self.roster.clone();
        let mut session = CombatSession::seeded(self.seed, self.rules);
        let report =
            session.resolve_phase(&self.declarations, &mut roster, &catalog, &mut CasualtyApplier);
        let (_, log) = session.into_parts();
        Ok((report, log, roster))
    }

    /// Whether replaying reproduces the recorded log.
    ///
    /// # Errors
    /// Returns an error if the replay cannot be played.
    pub fn verify(&self) -> Result<bool> {
        let (_, log, _) = self.play()?;
        let hash = log.state_hash();
        if hash != self.final_log_hash {
            tracing::warn!(
                scenario = %self.scenario_id,
                expected = self.final_log_hash,
                actual = hash,
                "Replay diverged"
            );
        }
        Ok(hash == self.final_log_hash)
    }
}
