//! # Hexwar Core
//!
//! Deterministic attack resolution for a hex-grid tactical wargame.
//!
//! This crate contains **only** resolution logic:
//! - No rendering
//! - No board or turn model
//! - No system randomness (every die comes from an injected [`dice::RandomSource`])
//! - No floating-point damage math (uses fixed-point)
//!
//! This separation enables:
//! - Replays reproducible from a session seed
//! - Headless tools and balance runs
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`handler`] - Attack handler state machine and variant dispatch
//! - [`heat`] - Heat-transfer resolution for heat-tracking targets
//! - [`dice`] - Random source abstraction and seeded implementation
//! - [`cluster`] - Cluster hits table
//! - [`targeting`] - To-hit context and hit location tables
//! - [`combatant`] - Capability-tagged combatants
//! - [`profile`] - Attack profiles and the weapon catalog contract
//! - [`log`] - Append-only combat log
//! - [`session`] - Per-game session driving sequential resolution
//! - [`replay`] - Recording and verifying resolved attacks
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod cluster;
pub mod combatant;
pub mod config;
pub mod data;
pub mod dice;
pub mod error;
pub mod handler;
pub mod heat;
pub mod log;
pub mod math;
pub mod outcome;
pub mod profile;
pub mod replay;
pub mod session;
pub mod targeting;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combatant::{Capabilities, Combatant, CombatantId, InfantryLoadout};
    pub use crate::config::RulesConfig;
    pub use crate::dice::{RandomSource, SeededDice};
    pub use crate::error::{ContractViolation, ResolutionError, Result};
    pub use crate::handler::{
        resolve, AttackHandler, AttackInputs, HandlerPhase, ResolutionVariant,
    };
    pub use crate::log::{CombatLog, CombatLogEntry, CombatLogSink, LogParam, MessageId};
    pub use crate::math::Fixed;
    pub use crate::outcome::{AttackEffect, AttackOutcome, DamageType, HeatDelta};
    pub use crate::profile::{
        AttackProfile, CatalogRegistry, DamageClass, WeaponCatalog, WeaponFlags, WeaponId,
    };
    pub use crate::session::{
        AttackDeclaration, CasualtyApplier, CombatSession, DamageApplier, PhaseReport, Roster,
    };
    pub use crate::targeting::{CoverState, HitLocation, HitTable, Location, SideTable, ToHitContext};
}
