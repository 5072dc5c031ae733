//! Error types for attack resolution.

use thiserror::Error;

use crate::combatant::CombatantId;
use crate::handler::HandlerPhase;
use crate::math::Fixed;
use crate::profile::WeaponId;

/// Result type alias using [`ResolutionError`].
pub type Result<T> = std::result::Result<T, ResolutionError>;

/// Ways the inputs of a single attack can break the resolution contract.
///
/// Every variant aborts the attack it was raised for. None of them are
/// recoverable by substituting a default value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// The catalog returned no profile for the declared weapon.
    #[error("no attack profile supplied")]
    MissingProfile,

    /// The targeting collaborator supplied no to-hit context.
    #[error("no to-hit context supplied")]
    MissingToHit,

    /// The declared weapon is not in the catalog.
    #[error("weapon is not in the catalog")]
    UnknownWeapon,

    /// A declared combatant is not on the roster.
    #[error("combatant {0} is not on the roster")]
    UnknownCombatant(CombatantId),

    /// An infantry attacker reported fewer than zero troopers.
    #[error("negative shooting strength {0}")]
    NegativeShootingStrength(i32),

    /// A conventional infantry attacker carries no aggregate trooper damage.
    #[error("conventional infantry attacker has no damage per trooper")]
    MissingDamagePerTrooper,

    /// A damage figure in the profile or attacker is below zero.
    #[error("negative damage value {0}")]
    NegativeDamage(Fixed),

    /// Hits times damage per hit leaves the fixed-point range.
    #[error("damage total exceeds the representable range")]
    DamageOverflow,

    /// A handler step was invoked out of order.
    #[error("handler step expected phase {expected:?} but handler is in {actual:?}")]
    PhaseOrder {
        /// Phase the step requires.
        expected: HandlerPhase,
        /// Phase the handler was actually in.
        actual: HandlerPhase,
    },
}

/// Top-level error type for the resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Required input for one attack is missing or inconsistent.
    #[error("Attack by {attacker} on {target} with '{weapon}' rejected: {violation}")]
    ContractViolation {
        /// Attacking combatant.
        attacker: CombatantId,
        /// Target combatant.
        target: CombatantId,
        /// Declared weapon.
        weapon: WeaponId,
        /// What was wrong with the inputs.
        violation: ContractViolation,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path or name of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Catalog content is internally inconsistent.
    #[error("Invalid catalog entry '{weapon}': {reason}")]
    InvalidCatalog {
        /// Offending weapon.
        weapon: WeaponId,
        /// Why the entry was rejected.
        reason: String,
    },

    /// Replay could not be saved, loaded or restored.
    #[error("Replay error: {0}")]
    Replay(String),
}

impl ResolutionError {
    /// Build a contract violation for the given attack.
    #[must_use]
    pub fn contract(
        attacker: CombatantId,
        target: CombatantId,
        weapon: &WeaponId,
        violation: ContractViolation,
    ) -> Self {
        Self::ContractViolation {
            attacker,
            target,
            weapon: weapon.clone(),
            violation,
        }
    }

    /// The underlying violation, if this is a contract error.
    #[must_use]
    pub fn violation(&self) -> Option<&ContractViolation> {
        match self {
            Self::ContractViolation { violation, .. } => Some(violation),
            _ => None,
        }
    }
}
