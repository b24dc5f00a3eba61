use anyhow::Result;

use ruedas_core::schema::Database;
use ruedas_search::Config;

pub fn show_status(config: &Config) -> Result<()> {
    let db_path = &config.database_path;

    println!("\nRuedas Status\n");
    println!("  Inventory: {}", db_path.display());

    if db_path.exists() {
        let db = Database::open_read_only(db_path)?;
        println!("  Vehicles: {}", db.count_vehicles()?);
    } else {
        println!("  Vehicles: none (inventory not created)");
        println!("\n  Run `ruedas import <file.json>` to load listings");
    }

    let model = match config.llm.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => config.llm.model.as_str(),
        _ => "disabled (deterministic fallbacks only)",
    };
    println!("  Language model: {model}");
    println!("  Default location: {}", config.default_location);

    Ok(())
}
