//! Loading and saving the JSON settings catalog.

use knob_remote::Catalog;
use std::path::Path;
use tracing::debug;

/// Reads a catalog from `path`.
pub fn load(path: &Path) -> Result<Catalog, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No catalog found at {:?}", path).into());
    }

    let text = std::fs::read_to_string(path)?;
    let catalog: Catalog = serde_json::from_str(&text)?;
    debug!(
        "Loaded {} settings from {:?}",
        catalog.setting_count(),
        path
    );
    Ok(catalog)
}

/// Writes `catalog` to `path` as pretty-printed JSON.
pub fn save(path: &Path, catalog: &Catalog) -> Result<(), Box<dyn std::error::Error>> {
    let text = serde_json::to_string_pretty(catalog)?;
    std::fs::write(path, text + "\n")?;
    Ok(())
}
