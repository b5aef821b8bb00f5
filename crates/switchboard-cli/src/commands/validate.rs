//! Validate catalog command
//!
//! Registration already checks each descriptor's shape and template syntax.
//! On top of that every provider is resolved with a sample value bound to
//! each of its placeholders, and the base URL of the root module and of
//! every selected module must parse as an absolute http(s) URL. Providers
//! are checked concurrently and every failure is reported.

use anyhow::{Result, bail};
use std::sync::Arc;
use switchboard_core::{ProviderInfo, Registry, Resolver, SubstitutionPlan, select_module};
use switchboard_runtime::{Error as RuntimeError, Future, combinators};
use url::Url;

use super::Catalog;

const SAMPLE_VALUE: &str = "example";

/// Run the validate command
pub async fn run(catalog_path: Option<&str>) -> Result<()> {
    let catalog = Catalog::load(catalog_path)?;
    if let Some(config) = &catalog.config {
        tracing::info!("✓ Project: {}", config.project.name);
        tracing::info!("✓ Version: {}", config.project.version);
    }

    let registry = Arc::new(catalog.registry);
    let checks: Vec<Future<String>> = registry
        .ids()
        .into_iter()
        .map(|id| {
            let registry = Arc::clone(&registry);
            let id = id.to_string();
            Future::spawn(move || async move { check_provider(&registry, &id) })
        })
        .collect();

    match combinators::combine_collect_errors(&checks).await {
        Ok(checked) => {
            for id in &checked {
                println!("✓ {}", id);
            }
            tracing::info!("✓ {} providers are valid", checked.len());
            Ok(())
        }
        Err(RuntimeError::Aggregate(failures)) => {
            for failure in failures.errors() {
                println!("✗ {}", failure);
            }
            bail!("{} provider(s) failed validation", failures.len())
        }
        Err(err) => Err(err.into()),
    }
}

fn check_provider(registry: &Registry, id: &str) -> switchboard_runtime::Result<String> {
    let fail = |err: switchboard_core::Error| RuntimeError::work(format!("{}: {}", id, err));

    let template = registry.lookup(id).map_err(fail)?;
    let sources = sample_sources(template).map_err(fail)?;
    let resolved = Resolver::new(registry)
        .resolve(id, sources)
        .map_err(fail)?;

    check_base_url(&resolved.base_url)
        .map_err(|err| RuntimeError::work(format!("{}: {}", id, err)))?;
    for module in resolved.module_ids() {
        let selected = select_module(&resolved, module);
        tracing::debug!(provider = %id, module = %selected.id, "module selected");
        check_base_url(&selected.info.base_url).map_err(|err| {
            RuntimeError::work(format!("{}: module '{}': {}", id, selected.id, err))
        })?;
    }
    Ok(id.to_string())
}

fn check_base_url(base_url: &str) -> std::result::Result<(), String> {
    let parsed =
        Url::parse(base_url).map_err(|e| format!("invalid baseURL '{}': {}", base_url, e))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(()),
        _ => Err(format!("baseURL '{}' is not an absolute http(s) URL", base_url)),
    }
}

fn sample_sources(template: &ProviderInfo) -> switchboard_core::Result<Vec<SubstitutionPlan>> {
    Ok(template
        .variables()?
        .into_iter()
        .map(|name| SubstitutionPlan::new(name, SAMPLE_VALUE))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::builtin;

    fn registry_with(descriptor: serde_json::Value) -> Registry {
        let mut registry = Registry::new();
        registry
            .register(serde_json::from_value(descriptor).unwrap())
            .unwrap();
        registry
    }

    #[test]
    fn test_embedded_providers_pass() {
        let registry = builtin::registry().unwrap();
        for id in registry.ids() {
            assert_eq!(check_provider(&registry, id).unwrap(), id);
        }
    }

    #[test]
    fn test_unknown_provider_fails() {
        let registry = builtin::registry().unwrap();
        let err = check_provider(&registry, "nope").unwrap_err();
        assert!(err.to_string().starts_with("nope: "));
    }

    #[test]
    fn test_unresolvable_root_base_url_fails() {
        let registry = registry_with(serde_json::json!({
            "name": "bare",
            "authType": "none",
            "baseURL": "{{.host}}"
        }));
        let err = check_provider(&registry, "bare").unwrap_err();
        assert!(err.to_string().contains("bare: invalid baseURL 'example'"));
    }

    #[test]
    fn test_module_base_url_is_checked() {
        let registry = registry_with(serde_json::json!({
            "name": "acme",
            "authType": "none",
            "baseURL": "https://api.acme.io",
            "modules": {
                "files": { "baseURL": "ftp://{{.workspace}}.acme.io", "displayName": "Files" }
            }
        }));
        let err = check_provider(&registry, "acme").unwrap_err();
        assert!(err.to_string().contains("module 'files'"));
        assert!(err.to_string().contains("not an absolute http(s) URL"));
    }
}
