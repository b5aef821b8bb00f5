//! Configuration parsing and catalog loading
//!
//! A catalog project is a directory holding `switchboard.yaml` and a
//! directory of provider descriptors, one per file.
//!
//! # Configuration Files
//!
//! - `switchboard.yaml` - Project root configuration
//! - `providers/**/*.yaml` - Provider descriptors (`.yml` and `.json` also accepted)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::descriptor::ProviderInfo;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::variables::SubstitutionPlan;

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "switchboard.yaml";

/// Root project configuration from `switchboard.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogConfig {
    /// Catalog name
    pub name: String,

    /// Catalog version
    #[serde(default = "default_version")]
    pub version: String,

    /// Directory holding provider descriptors, relative to the project
    #[serde(default = "default_providers_dir")]
    pub providers_dir: String,

    /// Default substitution values, applied after caller-supplied variables
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_providers_dir() -> String {
    "providers".to_string()
}

/// Main configuration container
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: CatalogConfig,

    /// Base path of the project
    pub base_path: PathBuf,
}

impl Config {
    /// Load configuration from a directory
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the project directory or `switchboard.yaml` file
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = Config::load("./my-catalog")?;
    /// println!("Catalog: {}", config.project.name);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (config_path, base_path) = if path.is_dir() {
            (path.join(CONFIG_FILE), path.to_path_buf())
        } else {
            (
                path.to_path_buf(),
                path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            )
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let project: CatalogConfig = serde_yaml::from_str(&contents)?;

        Ok(Self { project, base_path })
    }

    /// Absolute location of the providers directory
    pub fn providers_path(&self) -> PathBuf {
        self.base_path.join(&self.project.providers_dir)
    }

    /// Load every provider descriptor under the providers directory, sorted
    /// by path.
    pub fn load_providers(&self) -> Result<Vec<ProviderInfo>> {
        let dir = self.providers_path();
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(&dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml" || ext == "json")
            })
            .collect();
        paths.sort();

        let mut providers = Vec::with_capacity(paths.len());
        for path in paths {
            tracing::debug!(path = %path.display(), "loading provider descriptor");
            providers.push(load_descriptor(&path)?);
        }
        Ok(providers)
    }

    /// Build a registry from the providers directory
    pub fn registry(&self) -> Result<Registry> {
        Registry::from_providers(self.load_providers()?)
    }

    /// Configured default variables as substitution plans, sorted by name
    pub fn default_variables(&self) -> Vec<SubstitutionPlan> {
        self.project
            .vars
            .iter()
            .map(|(name, value)| SubstitutionPlan::new(name.clone(), value.clone()))
            .collect()
    }

    /// A resolver over `registry` that falls back to the configured variables
    pub fn resolver<'a>(&self, registry: &'a Registry) -> Resolver<'a> {
        Resolver::new(registry).with_defaults(self.default_variables())
    }
}

/// Parse a single descriptor file (JSON by extension, YAML otherwise)
pub fn load_descriptor(path: &Path) -> Result<ProviderInfo> {
    let contents = std::fs::read_to_string(path)?;
    let info = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
name: test-catalog
"#;
        let config: CatalogConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, "test-catalog");
        assert_eq!(config.version, "0.1.0");
        assert_eq!(config.providers_dir, "providers");
        assert!(config.vars.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
name: test-catalog
version: "1.0.0"
providers_dir: catalog
vars:
  region: eu
"#;
        let config: CatalogConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.providers_dir, "catalog");
        assert_eq!(config.vars["region"], "eu");
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_providers_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("providers/nested")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "name: test\n").unwrap();
        std::fs::write(
            dir.path().join("providers/b.yaml"),
            "name: beta\nauthType: none\nbaseURL: https://beta.example.com\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("providers/nested/a.json"),
            r#"{"name": "alpha", "authType": "none", "baseURL": "https://alpha.example.com"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("providers/README.md"), "ignored").unwrap();

        let config = Config::load(dir.path()).unwrap();
        let providers = config.load_providers().unwrap();
        let names: Vec<&str> = providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "alpha"]);

        let registry = config.registry().unwrap();
        assert_eq!(registry.ids(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_load_via_config_file_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "name: direct\n").unwrap();
        let config = Config::load(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.project.name, "direct");
        assert_eq!(config.base_path, dir.path());
        assert!(config.load_providers().unwrap().is_empty());
    }

    #[test]
    fn test_resolver_uses_config_vars() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("providers")).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "name: test\nvars:\n  region: eu\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("providers/regional.yaml"),
            "name: regional\nauthType: none\nbaseURL: \"https://{{.region}}.example.com\"\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        let registry = config.registry().unwrap();
        let resolver = config.resolver(&registry);

        let resolved = resolver
            .resolve("regional", Vec::<SubstitutionPlan>::new())
            .unwrap();
        assert_eq!(resolved.base_url, "https://eu.example.com");

        let overridden = resolver
            .resolve("regional", [SubstitutionPlan::new("region", "us")])
            .unwrap();
        assert_eq!(overridden.base_url, "https://us.example.com");
    }
}
