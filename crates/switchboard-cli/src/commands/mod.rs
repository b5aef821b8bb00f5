//! CLI command implementations

pub mod export;
pub mod list;
pub mod show;
pub mod validate;

use anyhow::{Context, Result};
use switchboard_core::{Config, Registry, Resolver, builtin};

/// The catalog a command operates on
pub struct Catalog {
    /// Registered provider templates
    pub registry: Registry,
    /// Project configuration, when loaded from disk
    pub config: Option<Config>,
}

impl Catalog {
    /// Load the project at `path`, or the embedded catalog when `None`
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            tracing::debug!("using embedded catalog");
            let registry = builtin::registry().context("Failed to load embedded catalog")?;
            return Ok(Self {
                registry,
                config: None,
            });
        };

        tracing::debug!("Loading catalog from {}", path);
        let config = Config::load(path).context("Failed to load configuration")?;
        let registry = config
            .registry()
            .with_context(|| format!("Failed to load providers for '{}'", config.project.name))?;
        Ok(Self {
            registry,
            config: Some(config),
        })
    }

    /// Resolver over this catalog, with configured defaults applied
    pub fn resolver(&self) -> Resolver<'_> {
        match &self.config {
            Some(config) => config.resolver(&self.registry),
            None => Resolver::new(&self.registry),
        }
    }
}

/// Parse a `NAME=VALUE` pair
pub fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    if name.is_empty() {
        return Err(format!("empty variable name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}
