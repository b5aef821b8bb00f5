//! List providers command

use anyhow::Result;

use super::Catalog;

/// Print every provider id, sorted, one per line
pub async fn run(catalog_path: Option<&str>) -> Result<()> {
    let catalog = Catalog::load(catalog_path)?;
    tracing::debug!("{} providers registered", catalog.registry.len());

    for id in catalog.registry.ids() {
        println!("{}", id);
    }
    Ok(())
}
