//! Data validation utilities.

use std::path::{Path, PathBuf};

use hexwar_core::profile::CatalogRegistry;

use crate::scenario::ToolError;

/// What a valid catalog file contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSummary {
    /// File that was checked.
    pub path: PathBuf,
    /// Number of weapons in it.
    pub weapons: usize,
}

/// Validate one weapon catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or holds
/// duplicate ids or negative damage values.
pub fn validate_catalog_file(path: &Path) -> Result<CatalogSummary, ToolError> {
    if !path.exists() {
        return Err(ToolError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let catalog = CatalogRegistry::from_ron_str(&path.display().to_string(), &contents)?;
    tracing::debug!(path = %path.display(), weapons = catalog.len(), "Catalog valid");
    Ok(CatalogSummary {
        path: path.to_path_buf(),
        weapons: catalog.len(),
    })
}

/// Validate a catalog file, or every `.ron` catalog in a directory.
///
/// # Errors
///
/// Returns the first error encountered.
pub fn validate_data_path(path: &Path) -> Result<Vec<CatalogSummary>, ToolError> {
    if !path.is_dir() {
        return Ok(vec![validate_catalog_file(path)?]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    // Stable report order.
    files.sort();

    files.iter().map(|file| validate_catalog_file(file)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        WeaponCatalogData(
            weapons: [
                WeaponData(id: "rifle", name: "Rifle", damage_per_target: 0.5),
                WeaponData(id: "smg", name: "SMG", damage_per_target: 0.5, flags: "BURST"),
            ],
        )
    "#;

    const DUPLICATE: &str = r#"
        WeaponCatalogData(
            weapons: [
                WeaponData(id: "rifle", name: "Rifle", damage_per_target: 0.5),
                WeaponData(id: "rifle", name: "Rifle II", damage_per_target: 0.6),
            ],
        )
    "#;

    #[test]
    fn test_valid_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ron"), VALID).unwrap();
        std::fs::write(dir.path().join("b.ron"), VALID).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let summaries = validate_data_path(dir.path()).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].path.ends_with("a.ron"));
        assert_eq!(summaries[0].weapons, 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.ron");
        std::fs::write(&path, DUPLICATE).unwrap();

        let err = validate_catalog_file(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_negative_damage_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neg.ron");
        std::fs::write(
            &path,
            r#"WeaponCatalogData(weapons: [WeaponData(id: "bad", name: "Bad", damage_per_target: -1.0)])"#,
        )
        .unwrap();

        assert!(validate_catalog_file(&path).is_err());
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        std::fs::write(&path, "WeaponCatalogData(weapons: [").unwrap();

        let err = validate_catalog_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }
}
