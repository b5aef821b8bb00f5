//! Provider registry
//!
//! Maps provider ids to descriptor templates. A registry is filled once (at
//! startup, from declarations or catalog files) and only read afterwards;
//! lookups hand out shared references to the templates, which are never
//! mutated. Resolution works on copies, see [`crate::resolver`].

use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap};

use crate::builtin;
use crate::descriptor::{ProviderId, ProviderInfo};
use crate::error::{Error, Result};

/// In-process mapping from provider id to descriptor template
#[derive(Debug, Clone, Default)]
pub struct Registry {
    providers: HashMap<ProviderId, ProviderInfo>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from descriptors, failing on the first invalid or
    /// duplicate entry.
    pub fn from_providers<I>(providers: I) -> Result<Self>
    where
        I: IntoIterator<Item = ProviderInfo>,
    {
        let mut registry = Self::new();
        for info in providers {
            registry.register(info)?;
        }
        Ok(registry)
    }

    /// Record a descriptor template under its own id.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDescriptor`] when shape validation fails and
    /// [`Error::DuplicateProvider`] when the id is already present.
    pub fn register(&mut self, info: ProviderInfo) -> Result<()> {
        info.validate()?;
        if self.providers.contains_key(&info.name) {
            return Err(Error::DuplicateProvider {
                provider: info.name,
            });
        }
        tracing::debug!(provider = %info.name, "registered provider");
        self.providers.insert(info.name.clone(), info);
        Ok(())
    }

    /// The template registered under `id`
    pub fn lookup(&self, id: &str) -> Result<&ProviderInfo> {
        self.providers.get(id).ok_or_else(|| Error::ProviderNotFound {
            provider: id.to_string(),
        })
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// All `(id, template)` pairs, in no particular order
    pub fn enumerate(&self) -> impl Iterator<Item = (&str, &ProviderInfo)> {
        self.providers
            .iter()
            .map(|(id, info)| (id.as_str(), info))
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Serialize the catalog as a JSON object keyed by provider id (sorted)
    pub fn to_json_pretty(&self) -> Result<String> {
        let sorted: BTreeMap<&str, &ProviderInfo> = self.enumerate().collect();
        Ok(serde_json::to_string_pretty(&sorted)?)
    }
}

impl TryFrom<Vec<ProviderInfo>> for Registry {
    type Error = Error;

    fn try_from(providers: Vec<ProviderInfo>) -> Result<Self> {
        Self::from_providers(providers)
    }
}

static GLOBAL: OnceCell<Registry> = OnceCell::new();

/// Process-wide registry seeded with the embedded catalog.
///
/// Built on first access and read-only from then on.
pub fn global() -> Result<&'static Registry> {
    GLOBAL.get_or_try_init(builtin::registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AuthType;

    fn provider(name: &str) -> ProviderInfo {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "authType": "none",
            "baseURL": format!("https://api.{name}.com"),
        }))
        .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register(provider("hubspot")).unwrap();
        let info = registry.lookup("hubspot").unwrap();
        assert_eq!(info.base_url, "https://api.hubspot.com");
        assert_eq!(info.auth_type, AuthType::None);
        assert!(registry.contains("hubspot"));
    }

    #[test]
    fn test_lookup_unknown_provider() {
        let registry = Registry::new();
        assert!(matches!(
            registry.lookup("nope"),
            Err(Error::ProviderNotFound { provider }) if provider == "nope"
        ));
    }

    #[test]
    fn test_reregistration_fails() {
        let mut registry = Registry::new();
        registry.register(provider("asana")).unwrap();
        let err = registry.register(provider("asana")).unwrap_err();
        assert!(matches!(err, Error::DuplicateProvider { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_invalid_shape() {
        let mut info = provider("asana");
        info.name = String::new();
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register(info),
            Err(Error::InvalidDescriptor { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_enumerate_and_ids() {
        let registry =
            Registry::from_providers(vec![provider("b"), provider("a"), provider("c")]).unwrap();
        assert_eq!(registry.enumerate().count(), 3);
        assert_eq!(registry.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_json_export_is_keyed_and_sorted() {
        let registry = Registry::try_from(vec![provider("zoom"), provider("asana")]).unwrap();
        let json = registry.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["zoom"]["baseURL"], "https://api.zoom.com");
        assert!(json.find("\"asana\"").unwrap() < json.find("\"zoom\"").unwrap());
    }

    #[test]
    fn test_global_registry_is_seeded() {
        let registry = global().unwrap();
        assert!(!registry.is_empty());
        assert!(registry.contains("salesforce"));
        assert!(std::ptr::eq(registry, global().unwrap()));
    }
}
