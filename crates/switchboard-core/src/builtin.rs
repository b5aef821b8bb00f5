//! Embedded default catalog
//!
//! A small set of representative providers compiled into the binary so the
//! registry is usable without any catalog files on disk.

use crate::descriptor::ProviderInfo;
use crate::error::Result;
use crate::registry::Registry;

const CATALOG: &[(&str, &str)] = &[
    ("atlassian.yaml", include_str!("../catalog/atlassian.yaml")),
    ("hubspot.yaml", include_str!("../catalog/hubspot.yaml")),
    ("pipedrive.yaml", include_str!("../catalog/pipedrive.yaml")),
    ("salesforce.yaml", include_str!("../catalog/salesforce.yaml")),
    ("stripe.yaml", include_str!("../catalog/stripe.yaml")),
    ("zendesk.yaml", include_str!("../catalog/zendesk.yaml")),
];

/// Parse the embedded descriptors
pub fn providers() -> Result<Vec<ProviderInfo>> {
    CATALOG
        .iter()
        .map(|(file, contents)| -> Result<ProviderInfo> {
            tracing::trace!(file, "parsing embedded descriptor");
            Ok(serde_yaml::from_str(contents)?)
        })
        .collect()
}

/// A fresh registry holding the embedded descriptors
pub fn registry() -> Result<Registry> {
    Registry::from_providers(providers()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_is_valid() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), CATALOG.len());
        assert_eq!(
            registry.ids(),
            vec![
                "atlassian",
                "hubspot",
                "pipedrive",
                "salesforce",
                "stripe",
                "zendeskSupport"
            ]
        );
    }

    #[test]
    fn test_module_tables() {
        let registry = registry().unwrap();
        let hubspot = registry.lookup("hubspot").unwrap();
        assert_eq!(hubspot.default_module.as_deref(), Some("crm"));
        assert_eq!(hubspot.module_ids(), vec!["crm", "marketing"]);
        assert!(registry.lookup("stripe").unwrap().modules.is_none());
    }
}
