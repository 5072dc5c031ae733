//! Session game options that change how attacks resolve.

use serde::{Deserialize, Serialize};

use crate::error::{ResolutionError, Result};

/// Optional rules enabled for a game session.
///
/// # Example RON
///
/// ```ron
/// RulesConfig(
///     heat_rules: true,
///     glancing_blows: true,
///     building_absorption: false,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Heat weapons may transfer heat to heat-tracking targets instead of damage.
    pub heat_rules: bool,
    /// Glancing blows penalize the cluster roll.
    pub glancing_blows: bool,
    /// Buildings absorb part of the damage aimed at their occupants.
    pub building_absorption: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            heat_rules: false,
            glancing_blows: true,
            building_absorption: true,
        }
    }
}

impl RulesConfig {
    /// Parse options from RON text; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid options record.
    pub fn from_ron_str(path: &str, content: &str) -> Result<Self> {
        ron::from_str(content).map_err(|e| ResolutionError::DataParseError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Builder method to toggle heat rules.
    #[must_use]
    pub const fn with_heat_rules(mut self, enabled: bool) -> Self {
        self.heat_rules = enabled;
        self
    }
}
