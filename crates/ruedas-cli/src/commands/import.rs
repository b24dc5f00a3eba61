use anyhow::{Context, Result};
use std::path::Path;

use ruedas_core::schema::Database;
use ruedas_search::Config;

pub fn run_import(config: &Config, path: &Path) -> Result<()> {
    log::info!("Importing vehicle listings from {}", path.display());
    let db_path = &config.database_path;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut db = Database::open(db_path)
        .with_context(|| format!("Failed to open inventory {}", db_path.display()))?;
    let imported = db
        .import_json(path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    println!("✓ Imported {} vehicles into {}", imported, db_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_import_creates_inventory() {
        let temp_dir = TempDir::new().unwrap();
        let listings = temp_dir.path().join("listings.json");
        std::fs::write(
            &listings,
            r#"[
                {"brand": "Toyota", "model": "Corolla", "year": 2019, "price": 18500, "location": "Puerto Rico"},
                {"brand": "Ford", "model": "F-150", "location": "Ponce"}
            ]"#,
        )
        .unwrap();

        let config = Config {
            database_path: temp_dir.path().join("data").join("inventory.db"),
            ..Config::default()
        };
        run_import(&config, &listings).unwrap();

        let db = Database::open_read_only(&config.database_path).unwrap();
        assert_eq!(db.count_vehicles().unwrap(), 2);
    }
}
