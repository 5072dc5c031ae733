//! Data structures for catalog configuration.
//!
//! Pure data structures deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `hexwar_tools`.

mod weapon_data;

pub use weapon_data::{WeaponCatalogData, WeaponData};
