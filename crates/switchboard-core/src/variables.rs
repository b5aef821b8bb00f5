//! Variable sources
//!
//! Callers describe the values available to a descriptor as a list of
//! [`VariableSource`]s. Each source yields one [`SubstitutionPlan`]; the plans
//! are folded into a [`SubstitutionRegistry`] where the first source to bind a
//! name wins.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::template::Bindings;

/// Declares that placeholder `from` expands to the literal `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionPlan {
    /// Placeholder name (without delimiters)
    pub from: String,
    /// Literal replacement
    pub to: String,
}

impl SubstitutionPlan {
    /// Create a plan binding `from` to `to`
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Anything that can contribute a binding to a resolution
pub trait VariableSource {
    /// The binding this source contributes
    fn substitution_plan(&self) -> SubstitutionPlan;
}

impl VariableSource for SubstitutionPlan {
    fn substitution_plan(&self) -> SubstitutionPlan {
        self.clone()
    }
}

impl<T: VariableSource + ?Sized> VariableSource for &T {
    fn substitution_plan(&self) -> SubstitutionPlan {
        (**self).substitution_plan()
    }
}

impl<T: VariableSource + ?Sized> VariableSource for Box<T> {
    fn substitution_plan(&self) -> SubstitutionPlan {
        (**self).substitution_plan()
    }
}

/// The customer's workspace (subdomain, instance or tenant name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace(pub String);

impl Workspace {
    /// Placeholder name bound by this source
    pub const NAME: &'static str = "workspace";

    /// Create a workspace source
    pub fn new(workspace: impl Into<String>) -> Self {
        Self(workspace.into())
    }
}

impl VariableSource for Workspace {
    fn substitution_plan(&self) -> SubstitutionPlan {
        SubstitutionPlan::new(Self::NAME, self.0.clone())
    }
}

/// The module the caller intends to talk to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVariable(pub String);

impl ModuleVariable {
    /// Placeholder name bound by this source
    pub const NAME: &'static str = "module";
}

impl VariableSource for ModuleVariable {
    fn substitution_plan(&self) -> SubstitutionPlan {
        SubstitutionPlan::new(Self::NAME, self.0.clone())
    }
}

/// A caller-supplied metadata value, such as a region or an instance name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataVariable {
    /// Placeholder name
    pub name: String,
    /// Value collected from the user
    pub value: String,
}

impl MetadataVariable {
    /// Create a metadata source
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl VariableSource for MetadataVariable {
    fn substitution_plan(&self) -> SubstitutionPlan {
        SubstitutionPlan::new(self.name.clone(), self.value.clone())
    }
}

/// Turn a metadata map into sources, ordered by key so resolution is
/// deterministic regardless of the map's iteration order.
pub fn metadata_variables<S: std::hash::BuildHasher>(
    metadata: &HashMap<String, String, S>,
) -> Vec<MetadataVariable> {
    let sorted: BTreeMap<&String, &String> = metadata.iter().collect();
    sorted
        .into_iter()
        .map(|(name, value)| MetadataVariable::new(name.clone(), value.clone()))
        .collect()
}

/// Placeholder name to literal, built from variable sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionRegistry {
    entries: HashMap<String, String>,
}

impl SubstitutionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the plans of `sources` in order; the first binding of a name wins.
    pub fn from_sources<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: VariableSource,
    {
        let mut registry = Self::new();
        for source in sources {
            registry.add(source.substitution_plan());
        }
        registry
    }

    /// Add a plan unless its name is already bound. Returns whether it was added.
    pub fn add(&mut self, plan: SubstitutionPlan) -> bool {
        if self.entries.contains_key(&plan.from) {
            tracing::debug!(name = %plan.from, "ignoring duplicate substitution plan");
            return false;
        }
        self.entries.insert(plan.from, plan.to);
        true
    }

    /// Add every plan produced by `sources` with the same first-wins rule
    pub fn extend<I>(&mut self, sources: I)
    where
        I: IntoIterator,
        I::Item: VariableSource,
    {
        for source in sources {
            self.add(source.substitution_plan());
        }
    }

    /// Value bound to `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of bound names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no names are bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bound names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Bindings for SubstitutionRegistry {
    fn binding(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_plan() {
        let plan = Workspace::new("acme").substitution_plan();
        assert_eq!(plan, SubstitutionPlan::new("workspace", "acme"));
    }

    #[test]
    fn test_first_writer_wins() {
        let sources: Vec<Box<dyn VariableSource>> = vec![
            Box::new(Workspace::new("first")),
            Box::new(MetadataVariable::new("workspace", "second")),
            Box::new(ModuleVariable("crm".to_string())),
        ];
        let registry = SubstitutionRegistry::from_sources(&sources);
        assert_eq!(registry.get("workspace"), Some("first"));
        assert_eq!(registry.get("module"), Some("crm"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_reports_duplicates() {
        let mut registry = SubstitutionRegistry::new();
        assert!(registry.add(SubstitutionPlan::new("a", "1")));
        assert!(!registry.add(SubstitutionPlan::new("a", "2")));
        assert_eq!(registry.get("a"), Some("1"));
    }

    #[test]
    fn test_metadata_variables_sorted() {
        let metadata = HashMap::from([
            ("region".to_string(), "eu".to_string()),
            ("instance".to_string(), "prod".to_string()),
        ]);
        let sources = metadata_variables(&metadata);
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["instance", "region"]);
    }

    #[test]
    fn test_registry_names_sorted() {
        let registry = SubstitutionRegistry::from_sources([
            SubstitutionPlan::new("b", "2"),
            SubstitutionPlan::new("a", "1"),
        ]);
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(!registry.is_empty());
    }
}
