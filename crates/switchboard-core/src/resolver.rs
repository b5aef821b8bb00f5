//! Catalog resolution
//!
//! Turns a registered template into a fully materialized descriptor:
//!
//! 1. look up the template (unknown ids fail)
//! 2. fold the caller's variable sources into a substitution registry,
//!    first writer wins, followed by any configured defaults
//! 3. walk a deep copy of the template, expanding every placeholder
//! 4. check the resolved copy and hand it to the caller
//!
//! The registered template is never touched, so resolving the same inputs
//! twice yields equal descriptors.

use crate::descriptor::{ModuleId, ModuleInfo, ProviderInfo, ROOT_MODULE};
use crate::error::{Error, Result};
use crate::registry::{self, Registry};
use crate::substitution::substituted;
use crate::variables::{SubstitutionPlan, SubstitutionRegistry, VariableSource};

/// Resolves descriptors from a registry
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    catalog: &'a Registry,
    defaults: Vec<SubstitutionPlan>,
}

impl<'a> Resolver<'a> {
    /// Resolve against `registry`
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            catalog: registry,
            defaults: Vec::new(),
        }
    }

    /// Replace the backing catalog. An empty override makes every resolution
    /// fail with [`Error::CatalogNotFound`].
    pub fn with_catalog(mut self, catalog: &'a Registry) -> Self {
        self.catalog = catalog;
        self
    }

    /// Bindings applied after the caller's sources, so callers always win
    pub fn with_defaults<I>(mut self, defaults: I) -> Self
    where
        I: IntoIterator,
        I::Item: VariableSource,
    {
        self.defaults
            .extend(defaults.into_iter().map(|s| s.substitution_plan()));
        self
    }

    /// Produce a resolved copy of provider `id`.
    ///
    /// # Errors
    ///
    /// [`Error::CatalogNotFound`], [`Error::ProviderNotFound`],
    /// [`Error::Substitution`] wrapping the template error, or
    /// [`Error::InvalidDescriptor`] when the resolved copy has an empty id or
    /// base URL.
    pub fn resolve<I>(&self, id: &str, sources: I) -> Result<ProviderInfo>
    where
        I: IntoIterator,
        I::Item: VariableSource,
    {
        if self.catalog.is_empty() {
            return Err(Error::CatalogNotFound);
        }
        let template = self.catalog.lookup(id)?;

        let mut bindings = SubstitutionRegistry::from_sources(sources);
        bindings.extend(self.defaults.iter());

        let resolved = substituted(template, &bindings)?;
        resolved.validate_resolved()?;

        tracing::debug!(
            provider = %id,
            variables = ?bindings.names(),
            "resolved provider descriptor"
        );
        Ok(resolved)
    }
}

/// Resolve against the process-wide registry
pub fn resolve<I>(id: &str, sources: I) -> Result<ProviderInfo>
where
    I: IntoIterator,
    I::Item: VariableSource,
{
    Resolver::new(registry::global()?).resolve(id, sources)
}

/// A module picked from a resolved descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedModule {
    /// Id of the module actually returned
    pub id: ModuleId,
    /// The module's configuration
    pub info: ModuleInfo,
    /// The requested module was unknown and another one was substituted
    pub fallback: bool,
}

/// Pick the module `module` from `info`.
///
/// - no module table: the root module synthesized from the top-level fields
/// - a known id: that entry
/// - an empty id or [`ROOT_MODULE`] missing from the table: the default
///   module, else the synthesized root
/// - an unknown id: the default module when one is configured, else the
///   synthesized root; `fallback` is set in both cases
pub fn select_module(info: &ProviderInfo, module: &str) -> SelectedModule {
    let root = || SelectedModule {
        id: ROOT_MODULE.to_string(),
        info: info.root_module(),
        fallback: false,
    };

    let Some(modules) = info.modules.as_ref() else {
        return root();
    };

    if let Some(found) = modules.get(module) {
        return SelectedModule {
            id: module.to_string(),
            info: found.clone(),
            fallback: false,
        };
    }

    let default = info
        .default_module
        .as_ref()
        .and_then(|id| modules.get(id).map(|m| (id, m)));

    if module.is_empty() {
        return match default {
            Some((id, found)) => SelectedModule {
                id: id.clone(),
                info: found.clone(),
                fallback: false,
            },
            None => root(),
        };
    }

    if module == ROOT_MODULE {
        return root();
    }

    match default {
        Some((id, found)) => {
            tracing::warn!(
                provider = %info.name,
                requested = %module,
                default = %id,
                "unknown module, falling back to default module"
            );
            SelectedModule {
                id: id.clone(),
                info: found.clone(),
                fallback: true,
            }
        }
        None => {
            tracing::warn!(
                provider = %info.name,
                requested = %module,
                "unknown module and no default, using root module"
            );
            SelectedModule {
                fallback: true,
                ..root()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::variables::{MetadataVariable, ModuleVariable, Workspace};

    fn registry() -> Registry {
        builtin::registry().unwrap()
    }

    #[test]
    fn test_resolve_workspace() {
        let registry = registry();
        let resolved = Resolver::new(&registry)
            .resolve("salesforce", [Workspace::new("test")])
            .unwrap();
        assert_eq!(resolved.base_url, "https://test.my.salesforce.com");
        assert_eq!(
            resolved.oauth2_opts.as_ref().unwrap().auth_url.as_deref(),
            Some("https://test.my.salesforce.com/services/oauth2/authorize")
        );
        assert_eq!(
            resolved.auth_health_check.as_ref().unwrap().url,
            "https://test.my.salesforce.com/services/data"
        );
    }

    #[test]
    fn test_resolve_does_not_mutate_template() {
        let registry = registry();
        let resolver = Resolver::new(&registry);
        let first = resolver
            .resolve("salesforce", [Workspace::new("a")])
            .unwrap();
        let second = resolver
            .resolve("salesforce", [Workspace::new("a")])
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            registry.lookup("salesforce").unwrap().base_url,
            "https://{{.workspace}}.my.salesforce.com"
        );
    }

    #[test]
    fn test_resolve_unknown_provider() {
        let registry = registry();
        let err = Resolver::new(&registry)
            .resolve("nope", Vec::<Workspace>::new())
            .unwrap_err();
        assert!(matches!(err, Error::ProviderNotFound { .. }));
    }

    #[test]
    fn test_resolve_missing_variable() {
        let registry = registry();
        let err = Resolver::new(&registry)
            .resolve("salesforce", Vec::<Workspace>::new())
            .unwrap_err();
        assert!(matches!(
            err.substitution_cause(),
            Some(Error::MissingSubstitution { name }) if name == "workspace"
        ));
    }

    #[test]
    fn test_empty_catalog_override() {
        let registry = registry();
        let empty = Registry::new();
        let err = Resolver::new(&registry)
            .with_catalog(&empty)
            .resolve("salesforce", [Workspace::new("a")])
            .unwrap_err();
        assert!(matches!(err, Error::CatalogNotFound));
    }

    #[test]
    fn test_caller_sources_beat_defaults() {
        let registry = registry();
        let resolved = Resolver::new(&registry)
            .with_defaults([
                SubstitutionPlan::new("region", "us"),
                SubstitutionPlan::new("workspace", "default-ws"),
            ])
            .resolve("zendeskSupport", [Workspace::new("acme")])
            .unwrap();
        assert_eq!(resolved.base_url, "https://acme.zendesk.com");
        assert_eq!(resolved.labels["region"], "us");
    }

    #[test]
    fn test_resolve_rejects_empty_base_url() {
        let registry = registry();
        let mut info = registry.lookup("zendeskSupport").unwrap().clone();
        info.name = "blank".to_string();
        info.base_url = "{{.workspace}}".to_string();
        let mut custom = Registry::new();
        custom.register(info).unwrap();
        let err = Resolver::new(&custom)
            .resolve(
                "blank",
                [
                    MetadataVariable::new("workspace", ""),
                    MetadataVariable::new("region", "eu"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_resolve_modules() {
        let registry = registry();
        let resolved = Resolver::new(&registry)
            .resolve(
                "atlassian",
                [
                    Box::new(MetadataVariable::new("cloudId", "c-123")) as Box<dyn VariableSource>,
                    Box::new(ModuleVariable("jira".to_string())) as Box<dyn VariableSource>,
                ],
            )
            .unwrap();
        let jira = select_module(&resolved, "jira");
        assert_eq!(jira.info.base_url, "https://api.atlassian.com/ex/jira/c-123");
        assert!(!jira.fallback);
    }

    #[test]
    fn test_select_module_without_table() {
        let registry = registry();
        let stripe = registry.lookup("stripe").unwrap();
        for requested in ["", "anything", ROOT_MODULE] {
            let selected = select_module(stripe, requested);
            assert_eq!(selected.id, ROOT_MODULE);
            assert_eq!(selected.info.base_url, "https://api.stripe.com");
            assert_eq!(selected.info.support, stripe.support);
            assert!(!selected.fallback);
        }
    }

    #[test]
    fn test_select_module_empty_uses_default() {
        let registry = registry();
        let hubspot = registry.lookup("hubspot").unwrap();
        let selected = select_module(hubspot, "");
        assert_eq!(selected.id, "crm");
        assert_eq!(selected.info.base_url, "https://api.hubapi.com/crm");
        assert!(!selected.fallback);
    }

    #[test]
    fn test_select_module_known() {
        let registry = registry();
        let hubspot = registry.lookup("hubspot").unwrap();
        let selected = select_module(hubspot, "marketing");
        assert_eq!(selected.id, "marketing");
        assert!(!selected.info.support.write);
    }

    #[test]
    fn test_select_module_unknown_falls_back_to_default() {
        let registry = registry();
        let hubspot = registry.lookup("hubspot").unwrap();
        let selected = select_module(hubspot, "sales");
        assert_eq!(selected.id, "crm");
        assert!(selected.fallback);
    }

    #[test]
    fn test_select_module_empty_table_synthesizes_root() {
        let registry = registry();
        let mut info = registry.lookup("stripe").unwrap().clone();
        info.modules = Some(Default::default());
        let selected = select_module(&info, "");
        assert_eq!(selected.id, ROOT_MODULE);
        assert_eq!(selected.info.base_url, info.base_url);
    }

    #[test]
    fn test_global_resolve() {
        let resolved = resolve("pipedrive", [Workspace::new("acme")]).unwrap();
        assert_eq!(resolved.base_url, "https://acme.pipedrive.com/api");
    }
}
