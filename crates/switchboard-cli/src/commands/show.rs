//! Resolve and show a provider

use anyhow::{Context, Result};
use switchboard_core::{
    MetadataVariable, ModuleVariable, VariableSource, Workspace, select_module,
};

use super::Catalog;

/// Options for the show command
#[derive(Debug, Default)]
pub struct ShowOptions {
    /// Module to select from the resolved provider
    pub module: Option<String>,
    /// Workspace binding
    pub workspace: Option<String>,
    /// Extra `(name, value)` bindings
    pub vars: Vec<(String, String)>,
    /// Skip resolution and print the template
    pub raw: bool,
}

impl ShowOptions {
    /// Variable sources in priority order: workspace, module, then `--var`
    fn sources(&self) -> Vec<Box<dyn VariableSource>> {
        let mut sources: Vec<Box<dyn VariableSource>> = Vec::new();
        if let Some(workspace) = &self.workspace {
            sources.push(Box::new(Workspace::new(workspace.clone())));
        }
        if let Some(module) = &self.module {
            sources.push(Box::new(ModuleVariable(module.clone())));
        }
        for (name, value) in &self.vars {
            sources.push(Box::new(MetadataVariable::new(name.clone(), value.clone())));
        }
        sources
    }
}

/// Run the show command
pub async fn run(catalog_path: Option<&str>, provider: &str, options: &ShowOptions) -> Result<()> {
    let catalog = Catalog::load(catalog_path)?;

    if options.raw {
        let template = catalog.registry.lookup(provider)?;
        println!("{}", serde_json::to_string_pretty(template)?);
        return Ok(());
    }

    let resolved = catalog
        .resolver()
        .resolve(provider, options.sources())
        .with_context(|| format!("Failed to resolve provider '{}'", provider))?;

    let json = match &options.module {
        Some(module) => {
            let selected = select_module(&resolved, module);
            serde_json::to_string_pretty(&serde_json::json!({
                "provider": resolved.name,
                "module": selected.id,
                "fallback": selected.fallback,
                "info": selected.info,
            }))?
        }
        None => serde_json::to_string_pretty(&resolved)?,
    };
    println!("{}", json);
    Ok(())
}
