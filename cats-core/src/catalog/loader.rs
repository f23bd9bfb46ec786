//! Catalog Loader
//!
//! Loads catalogs from:
//! - JSON strings
//! - JSON files
//! - Search paths (`<dir>/<name>.json`)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CatsError, Result};
use crate::registry::Registry;

use super::manifest::CatalogManifest;

/// A loaded catalog with its source information
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub manifest: CatalogManifest,

    /// Source path (if loaded from file)
    pub source_path: Option<PathBuf>,
}

/// Loader for catalogs from various sources
#[derive(Debug)]
pub struct CatalogLoader {
    /// Loaded catalogs by name
    catalogs: HashMap<String, LoadedCatalog>,

    /// Directories searched by `discover`
    search_paths: Vec<PathBuf>,

    validate_on_load: bool,
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self {
            catalogs: HashMap::new(),
            search_paths: vec![],
            validate_on_load: true,
        }
    }

    /// Add a search path for catalog discovery
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Disable validation on load
    pub fn skip_validation(mut self) -> Self {
        self.validate_on_load = false;
        self
    }

    /// Load a catalog from a JSON string, returning its name
    pub fn load_from_json(&mut self, json: &str) -> Result<String> {
        let manifest: CatalogManifest =
            serde_json::from_str(json).map_err(|e| CatsError::InvalidCatalog {
                reason: e.to_string(),
            })?;
        self.insert(manifest, None)
    }

    /// Load a catalog from a JSON file, returning its name
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CatsError::CatalogLoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let manifest: CatalogManifest =
            serde_json::from_str(&content).map_err(|e| CatsError::InvalidCatalog {
                reason: format!("{}: {}", path.display(), e),
            })?;
        self.insert(manifest, Some(path.to_path_buf()))
    }

    /// Find `<name>.json` in the search paths and load the first hit
    pub fn discover(&mut self, name: &str) -> Result<String> {
        let file_name = format!("{}.json", name);
        let found = self
            .search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => self.load_from_file(path),
            None => Err(CatsError::CatalogLoadError {
                path: file_name,
                reason: format!("not found in {} search path(s)", self.search_paths.len()),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&LoadedCatalog> {
        self.catalogs.get(name)
    }

    /// Names of loaded catalogs, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.catalogs.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// Install every loaded catalog into `registry`, in name order
    pub fn install_all(&self, registry: &Registry) {
        for name in self.names() {
            if let Some(loaded) = self.catalogs.get(name) {
                loaded.manifest.install(registry);
            }
        }
    }

    fn insert(&mut self, manifest: CatalogManifest, source_path: Option<PathBuf>) -> Result<String> {
        if self.validate_on_load {
            manifest
                .validate()
                .map_err(|errors| CatsError::InvalidCatalog {
                    reason: errors.join("; "),
                })?;
        }

        let name = manifest.name.clone();
        tracing::debug!(catalog = %name, source = ?source_path, "loaded catalog");

        self.catalogs.insert(
            name.clone(),
            LoadedCatalog {
                manifest,
                source_path,
            },
        );
        Ok(name)
    }
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "catalog_version": "1.0",
        "name": "teams",
        "categories": [{ "name": "Team" }],
        "derivations": [{ "category": "Team", "items": ["lakers", "warriors"] }]
    }"#;

    #[test]
    fn test_load_from_json() {
        let mut loader = CatalogLoader::new();
        let name = loader.load_from_json(MINIMAL).unwrap();

        assert_eq!(name, "teams");
        assert!(loader.get("teams").is_some());
        assert_eq!(loader.names(), vec!["teams"]);
    }

    #[test]
    fn test_invalid_json() {
        let mut loader = CatalogLoader::new();
        let err = loader.load_from_json("{ not json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CATALOG");
    }

    #[test]
    fn test_validation_can_be_skipped() {
        let json = r#"{ "catalog_version": "0.9", "name": "old" }"#;

        let mut strict = CatalogLoader::new();
        assert!(strict.load_from_json(json).is_err());

        let mut lenient = CatalogLoader::new().skip_validation();
        assert_eq!(lenient.load_from_json(json).unwrap(), "old");
    }

    #[test]
    fn test_discover_in_search_path() {
        let dir = std::env::temp_dir().join(format!("cats-loader-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut file = fs::File::create(dir.join("teams.json")).unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let mut loader = CatalogLoader::new().with_search_path(&dir);
        assert_eq!(loader.discover("teams").unwrap(), "teams");
        assert_eq!(
            loader.get("teams").unwrap().source_path.as_deref(),
            Some(dir.join("teams.json").as_path())
        );

        let err = loader.discover("players").unwrap_err();
        assert_eq!(err.error_code(), "CATALOG_LOAD_ERROR");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_install_all() {
        let mut loader = CatalogLoader::new();
        loader.load_from_json(MINIMAL).unwrap();

        let registry = Registry::new();
        loader.install_all(&registry);

        let teams = registry.open_set("Team", crate::Context::new()).unwrap();
        assert_eq!(teams.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let mut loader = CatalogLoader::new();
        let err = loader.load_from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatsError::CatalogLoadError { .. }));
    }
}
