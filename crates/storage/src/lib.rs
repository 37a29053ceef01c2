use directories::ProjectDirs;
use doc_model::{MaterialCatalog, MaterialEntry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CATALOG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("catalog schema version {0} is newer than this build supports")]
    UnsupportedVersion(u32),
    #[error("catalog entry {name:?} is invalid: {reason}")]
    InvalidEntry { name: String, reason: &'static str },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogEnvelope {
    version: u32,
    catalog: MaterialCatalog,
}

impl Storage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs =
            ProjectDirs::from("dev", "matquote", "matquote").ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_catalog(&self) -> Result<MaterialCatalog, StorageError> {
        let path = self.catalog_path();
        if !path.exists() {
            return Ok(MaterialCatalog::default());
        }

        let bytes = fs::read(path)?;
        let envelope: CatalogEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version > CATALOG_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion(envelope.version));
        }
        validate_catalog(&envelope.catalog)?;

        Ok(envelope.catalog)
    }

    pub fn save_catalog(&self, catalog: &MaterialCatalog) -> Result<(), StorageError> {
        validate_catalog(catalog)?;
        fs::create_dir_all(&self.root)?;

        let envelope = CatalogEnvelope { version: CATALOG_SCHEMA_VERSION, catalog: catalog.clone() };

        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(self.catalog_path(), bytes)?;
        Ok(())
    }

    /// Location of the optional annotation settings file next to the catalog.
    pub fn settings_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    fn catalog_path(&self) -> PathBuf {
        self.root.join("catalog.json")
    }
}

/// Reject entries a hand-edited catalog file can carry but annotation can't use.
fn validate_catalog(catalog: &MaterialCatalog) -> Result<(), StorageError> {
    for (name, entry) in &catalog.materials {
        if let Some(reason) = entry_problem(name, entry) {
            return Err(StorageError::InvalidEntry { name: name.clone(), reason });
        }
    }
    Ok(())
}

fn entry_problem(name: &str, entry: &MaterialEntry) -> Option<&'static str> {
    let digits = entry.color.trim().trim_start_matches('#');
    if name.trim().is_empty() {
        Some("empty material name")
    } else if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some("color is not #RRGGBB")
    } else if entry.unit_price.is_some_and(|price| !price.is_finite() || price < 0.0) {
        Some("unit price must be a non-negative number")
    } else {
        None
    }
}
