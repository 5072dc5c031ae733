//! Weapon data structures for data-driven catalogs.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, Fixed};
use crate::profile::{DamageClass, WeaponFlags, WeaponId};

/// Data-driven weapon record.
///
/// Only the fields the resolution engine consumes are modelled; cost,
/// tech availability and the rest of a full record stay with the
/// catalog's owner.
///
/// # Example RON
///
/// ```ron
/// WeaponData(
///     id: "flamer_man_portable",
///     name: "Man-Portable Flamer",
///     damage_per_target: 0.35,
///     flags: "SUPPORT",
///     damage_class: Heat,
///     range_increment: 1,
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeaponData {
    /// Unique identifier used by attack declarations.
    pub id: WeaponId,

    /// Display name.
    pub name: String,

    /// Damage each trooper (or the weapon itself) deals to one target.
    #[serde(with = "decimal_serde")]
    pub damage_per_target: Fixed,

    /// Behavioral flags.
    #[serde(default)]
    pub flags: WeaponFlags,

    /// Special damage class.
    #[serde(default)]
    pub damage_class: DamageClass,

    /// Hexes per range band (0 means the weapon only fires point-blank).
    #[serde(default)]
    pub range_increment: u8,
}

impl WeaponData {
    /// Standard point-blank weapon with no flags.
    #[must_use]
    pub fn new(id: impl Into<WeaponId>, name: impl Into<String>, damage_per_target: Fixed) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            damage_per_target,
            flags: WeaponFlags::empty(),
            damage_class: DamageClass::Standard,
            range_increment: 0,
        }
    }

    /// Builder method to set flags.
    #[must_use]
    pub fn with_flags(mut self, flags: WeaponFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Builder method to set the damage class.
    #[must_use]
    pub fn with_damage_class(mut self, damage_class: DamageClass) -> Self {
        self.damage_class = damage_class;
        self
    }

    /// Builder method to set the range increment.
    #[must_use]
    pub fn with_range_increment(mut self, range_increment: u8) -> Self {
        self.range_increment = range_increment;
        self
    }
}

/// Root of a catalog RON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponCatalogData {
    /// All weapon records.
    pub weapons: Vec<WeaponData>,
}
