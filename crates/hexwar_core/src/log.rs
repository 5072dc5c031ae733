//! Append-only combat log.
//!
//! Entries are structured: a message id, the combatant the message is
//! about, and the values interpolated into the message template. Text
//! is only produced on demand by [`MessageCatalog`], so the structured
//! stream is what replays compare.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::combatant::CombatantId;

/// Numeric message code of a log entry.
pub type MessageId = u16;

/// Message codes emitted by the engine.
pub mod messages {
    use super::MessageId;

    /// Primary entry: troopers hit, tables used, damage caused.
    pub const TROOPERS_HIT: MessageId = 3325;
    /// Burst weapon rolled extra damage against troopers.
    pub const BURST_BONUS: MessageId = 3326;
    /// Non-penetrating weapon against a structure.
    pub const NON_PENETRATING: MessageId = 3327;
    /// Mechanized troopers shielded by their vehicles.
    pub const MECHANIZED_HALVED: MessageId = 3328;
    /// Heat transferred to the target.
    pub const HEAT_APPLIED: MessageId = 3400;
    /// Heat transferred, reduced by heat-dissipating armor.
    pub const HEAT_DISSIPATED: MessageId = 3406;
    /// Building absorbed part of the damage.
    pub const BUILDING_ABSORBS: MessageId = 3435;
    /// Shot struck cover instead of the target.
    pub const PARTIAL_COVER: MessageId = 3460;
}

/// Typed value interpolated into a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogParam {
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
}

impl std::fmt::Display for LogParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// One structured log entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Message code.
    pub message_id: MessageId,
    /// Combatant the entry is about.
    pub subject_id: CombatantId,
    /// Values in template order.
    pub params: Vec<LogParam>,
    /// Nesting depth under the primary entry.
    pub indent: u8,
}

impl CombatLogEntry {
    /// Create an entry with no parameters.
    #[must_use]
    pub const fn new(message_id: MessageId, subject_id: CombatantId) -> Self {
        Self {
            message_id,
            subject_id,
            params: Vec::new(),
            indent: 0,
        }
    }

    /// Builder method to append an integer parameter.
    #[must_use]
    pub fn with_int(mut self, value: impl Into<i64>) -> Self {
        self.params.push(LogParam::Int(value.into()));
        self
    }

    /// Builder method to append a text parameter.
    #[must_use]
    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        self.params.push(LogParam::Text(value.into()));
        self
    }

    /// Builder method to set the indent level.
    #[must_use]
    pub const fn indented(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Destination for log entries. Append-only.
pub trait CombatLogSink {
    /// Append one entry after all previous ones.
    fn append(&mut self, entry: CombatLogEntry);
}

impl<L: CombatLogSink + ?Sized> CombatLogSink for &mut L {
    fn append(&mut self, entry: CombatLogEntry) {
        (**self).append(entry);
    }
}

/// In-memory combat log for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatLog {
    entries: Vec<CombatLogEntry>,
}

impl CombatLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in emission order.
    #[must_use]
    pub fn entries(&self) -> &[CombatLogEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the structured entry stream, for replay verification.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.entries.len().hash(&mut hasher);
        for entry in &self.entries {
            entry.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Render every entry as text, one line each.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(out, "{}", MessageCatalog::render(entry));
        }
        out
    }
}

impl CombatLogSink for CombatLog {
    fn append(&mut self, entry: CombatLogEntry) {
        self.entries.push(entry);
    }
}

/// Text templates for message ids. `<data>` marks a parameter slot.
pub struct MessageCatalog;

impl MessageCatalog {
    /// Template for a message id.
    #[must_use]
    pub const fn template(message_id: MessageId) -> Option<&'static str> {
        match message_id {
            messages::TROOPERS_HIT => Some("<data> trooper(s) hit <data>, causing <data> damage."),
            messages::BURST_BONUS => Some("Burst fire adds <data> damage."),
            messages::NON_PENETRATING => Some("<data> cannot damage the structure."),
            messages::MECHANIZED_HALVED => {
                Some("Mechanized troopers take half damage (<data> of <data>).")
            }
            messages::HEAT_APPLIED => Some("Target gains <data> heat."),
            messages::HEAT_DISSIPATED => {
                Some("Target gains <data> heat (halved by <data> armor).")
            }
            messages::BUILDING_ABSORBS => Some("Building absorbs <data> damage."),
            messages::PARTIAL_COVER => Some("Shot at <data> strikes cover."),
            _ => None,
        }
    }

    /// Render an entry with its parameters and indent.
    #[must_use]
    pub fn render(entry: &CombatLogEntry) -> String {
        let mut out = "  ".repeat(usize::from(entry.indent));
        let mut params = entry.params.iter();

        match Self::template(entry.message_id) {
            Some(template) => {
                let mut pieces = template.split("<data>");
                if let Some(first) = pieces.next() {
                    out.push_str(first);
                }
                for piece in pieces {
                    if let Some(param) = params.next() {
                        let _ = write!(out, "{param}");
                    }
                    out.push_str(piece);
                }
            }
            None => {
                let _ = write!(out, "[message {}]", entry.message_id);
                for param in params {
                    let _ = write!(out, " {param}");
                }
            }
        }
        out
    }
}
