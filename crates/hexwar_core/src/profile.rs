//! Attack profiles and the weapon catalog contract.
//!
//! An [`AttackProfile`] is the slice of a weapon record the resolution
//! engine needs. Profiles are read once per attack from a
//! [`WeaponCatalog`] and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::data::{WeaponCatalogData, WeaponData};
use crate::error::{ContractViolation, ResolutionError, Result};
use crate::math::{fixed_serde, Fixed};

/// Catalog key of a weapon type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaponId(String);

impl WeaponId {
    /// Create a weapon id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WeaponId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

bitflags! {
    /// Behavioral flags of a weapon type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct WeaponFlags: u8 {
        /// Erratic automatic fire; extra lethality against troopers in the open.
        const BURST           = 1 << 0;
        /// Stun-class weapon that cannot harm unoccupied structures.
        const NON_PENETRATING = 1 << 1;
        /// Crew-served support weapon.
        const SUPPORT         = 1 << 2;
        /// Heavy enough to slow the carrier.
        const ENCUMBERING     = 1 << 3;
    }
}

/// Special damage class of a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamageClass {
    /// Ordinary kinetic or energy damage.
    #[default]
    Standard,
    /// Flamer-type weapons that can deliver heat instead of damage.
    Heat,
    /// Incendiary munitions.
    Inferno,
}

impl DamageClass {
    /// Whether the weapon can transfer heat to heat-tracking targets.
    #[must_use]
    pub const fn generates_heat(self) -> bool {
        matches!(self, Self::Heat | Self::Inferno)
    }
}

/// Per-weapon resolution data for one attack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Weapon identity.
    pub weapon: WeaponId,
    /// Damage dealt per target by one firing member.
    #[serde(with = "fixed_serde")]
    pub base_damage_per_target: Fixed,
    /// Behavioral flags.
    pub flags: WeaponFlags,
    /// Special damage class.
    pub damage_class: DamageClass,
    /// Range band of this attack; 0 is point-blank.
    pub range_band: u8,
    /// Hexes per range band; 0 fires at point-blank only.
    #[serde(default)]
    pub range_increment: u8,
}

impl AttackProfile {
    /// Create a standard profile at point-blank range.
    #[must_use]
    pub fn new(weapon: impl Into<WeaponId>, base_damage_per_target: Fixed) -> Self {
        Self {
            weapon: weapon.into(),
            base_damage_per_target,
            flags: WeaponFlags::empty(),
            damage_class: DamageClass::Standard,
            range_band: 0,
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

    /// Copy of this profile for an attack at the given range band.
    #[must_use]
    pub fn at_range_band(mut self, range_band: u8) -> Self {
        self.range_band = range_band;
        self
    }

    /// Builder method to set the hexes per range band.
    #[must_use]
    pub fn with_range_increment(mut self, range_increment: u8) -> Self {
        self.range_increment = range_increment;
        self
    }

    /// Copy of this profile for a target `distance` hexes away.
    ///
    /// Each full increment beyond the first moves the attack out one band.
    #[must_use]
    pub fn at_distance(self, distance: u32) -> Self {
        if self.range_increment == 0 || distance == 0 {
            return self.at_range_band(0);
        }
        let band = distance.div_ceil(u32::from(self.range_increment)) - 1;
        self.at_range_band(u8::try_from(band).unwrap_or(u8::MAX))
    }

    /// Burst-fire weapon.
    #[must_use]
    pub fn is_burst(&self) -> bool {
        self.flags.contains(WeaponFlags::BURST)
    }

    /// Non-penetrating weapon.
    #[must_use]
    pub fn is_non_penetrating(&self) -> bool {
        self.flags.contains(WeaponFlags::NON_PENETRATING)
    }

    /// Point-blank attack.
    #[must_use]
    pub const fn is_point_blank(&self) -> bool {
        self.range_band == 0
    }

    /// Check the profile is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns the violation if the base damage is negative.
    pub fn validate(&self) -> std::result::Result<(), ContractViolation> {
        if self.base_damage_per_target < Fixed::ZERO {
            return Err(ContractViolation::NegativeDamage(self.base_damage_per_target));
        }
        Ok(())
    }
}

impl From<&WeaponData> for AttackProfile {
    fn from(data: &WeaponData) -> Self {
        Self {
            weapon: data.id.clone(),
            base_damage_per_target: data.damage_per_target,
            flags: data.flags,
            damage_class: data.damage_class,
            range_band: 0,
            range_increment: data.range_increment,
        }
    }
}

/// Read-only weapon lookup consumed by the engine.
pub trait WeaponCatalog {
    /// Profile for `weapon` at point-blank range, or `None` if unknown.
    fn attack_profile(&self, weapon: &WeaponId) -> Option<AttackProfile>;
}

/// In-memory catalog loaded from weapon records.
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistry {
    weapons: BTreeMap<WeaponId, WeaponData>,
}

impl CatalogRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from RON catalog text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or an entry is invalid.
    pub fn from_ron_str(path: &str, content: &str) -> Result<Self> {
        let data: WeaponCatalogData =
            ron::from_str(content).map_err(|e| ResolutionError::DataParseError {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let mut registry = Self::new();
        for weapon in data.weapons {
            registry.insert(weapon)?;
        }
        tracing::debug!(path, weapons = registry.len(), "Loaded weapon catalog");
        Ok(registry)
    }

    /// Add a weapon record.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate ids or negative damage.
    pub fn insert(&mut self, weapon: WeaponData) -> Result<()> {
        if weapon.damage_per_target < Fixed::ZERO {
            return Err(ResolutionError::InvalidCatalog {
                weapon: weapon.id,
                reason: "damage per target is negative".to_string(),
            });
        }
        if self.weapons.contains_key(&weapon.id) {
            return Err(ResolutionError::InvalidCatalog {
                weapon: weapon.id,
                reason: "duplicate weapon id".to_string(),
            });
        }
        self.weapons.insert(weapon.id.clone(), weapon);
        Ok(())
    }

    /// Raw record for a weapon.
    #[must_use]
    pub fn get(&self, weapon: &WeaponId) -> Option<&WeaponData> {
        self.weapons.get(weapon)
    }

    /// Number of weapons in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Iterate records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &WeaponData> {
        self.weapons.values()
    }
}

impl WeaponCatalog for CatalogRegistry {
    fn attack_profile(&self, weapon: &WeaponId) -> Option<AttackProfile> {
        self.weapons.get(weapon).map(AttackProfile::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::hundredths;

    const CATALOG: &str = r#"
        WeaponCatalogData(
            weapons: [
                WeaponData(id: "stunstick", name: "Stunstick", damage_per_target: 0.1, flags: "NON_PENETRATING"),
                WeaponData(id: "auto_rifle", name: "Auto Rifle", damage_per_target: 0.52, flags: "BURST", range_increment: 3),
            ],
        )
    "#;

    #[test]
    fn test_registry_parses_and_looks_up() {
        let registry = CatalogRegistry::from_ron_str("inline", CATALOG).unwrap();
        assert_eq!(registry.len(), 2);

        let profile = registry.attack_profile(&WeaponId::new("auto_rifle")).unwrap();
        assert!(profile.is_burst());
        assert!(!profile.is_non_penetrating());
        assert!(profile.is_point_blank());
        assert_eq!(profile.damage_class, DamageClass::Standard);

        let stun = registry.attack_profile(&"stunstick".into()).unwrap();
        assert!(stun.is_non_penetrating());
    }

    #[test]
    fn test_unknown_weapon() {
        let registry = CatalogRegistry::from_ron_str("inline", CATALOG).unwrap();
        assert!(registry.attack_profile(&WeaponId::new("railgun")).is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut registry = CatalogRegistry::new();
        let record = WeaponData {
            id: WeaponId::new("rifle"),
            name: "Rifle".to_string(),
            damage_per_target: hundredths(25),
            flags: WeaponFlags::empty(),
            damage_class: DamageClass::Standard,
            range_increment: 3,
        };
        registry.insert(record.clone()).unwrap();
        let err = registry.insert(record).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidCatalog { .. }));
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = CatalogRegistry::from_ron_str("broken.ron", "WeaponCatalogData(").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn test_profile_validation() {
        let profile = AttackProfile::new("bad", Fixed::from_num(-1));
        assert_eq!(
            profile.validate(),
            Err(ContractViolation::NegativeDamage(Fixed::from_num(-1)))
        );
        assert!(AttackProfile::new("ok", hundredths(30)).validate().is_ok());
    }

    #[test]
    fn test_heat_classes() {
        assert!(DamageClass::Heat.generates_heat());
        assert!(DamageClass::Inferno.generates_heat());
        assert!(!DamageClass::Standard.generates_heat());
    }

    #[test]
    fn test_distance_to_range_band() {
        let rifle = AttackProfile::new("rifle", hundredths(25)).with_range_increment(3);
        assert_eq!(rifle.clone().at_distance(0).range_band, 0);
        assert_eq!(rifle.clone().at_distance(3).range_band, 0);
        assert_eq!(rifle.clone().at_distance(4).range_band, 1);
        assert_eq!(rifle.clone().at_distance(7).range_band, 2);

        let pistol = AttackProfile::new("pistol", hundredths(20)).at_range_band(3);
        assert!(pistol.at_distance(9).is_point_blank());
    }

    #[test]
    fn test_catalog_carries_range_increment() {
        let registry = CatalogRegistry::from_ron_str("inline", CATALOG).unwrap();
        let rifle = registry.attack_profile(&WeaponId::new("auto_rifle")).unwrap();
        assert_eq!(rifle.range_increment, 3);
        assert_eq!(rifle.at_distance(5).range_band, 1);
    }

    #[test]
    fn test_range_band_copy_leaves_original() {
        let profile = AttackProfile::new("rifle", hundredths(25));
        let far = profile.clone().at_range_band(2);
        assert!(profile.is_point_blank());
        assert!(!far.is_point_blank());
    }
}
