//! Export the catalog as JSON

use anyhow::{Context, Result};

use super::Catalog;

/// Run the export command
pub async fn run(catalog_path: Option<&str>, output: Option<&str>) -> Result<()> {
    let catalog = Catalog::load(catalog_path)?;
    let json = catalog
        .registry
        .to_json_pretty()
        .context("Failed to serialize catalog")?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write {}", path))?;
            tracing::info!(
                "✓ Exported {} providers to {}",
                catalog.registry.len(),
                path
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
