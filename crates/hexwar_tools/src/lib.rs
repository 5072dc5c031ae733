//! # Hexwar Development Tools
//!
//! Command-line tools for development:
//! - Weapon catalog validation
//! - Headless scenario resolution
//! - Replay recording and verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod scenario;
pub mod validate;

pub use scenario::{Scenario, ScenarioRun, ToolError};
