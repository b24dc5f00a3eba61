use anyhow::Result;
use ruedas_search::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================\n");

    let path = config::config_file_path();
    println!("Config file: {}", path.display());
    println!(
        "File exists: {}\n",
        if path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  database_path: {}", config.database_path.display());
    println!("  default_location: {}", config.default_location);
    println!("  llm.base_url: {}", config.llm.base_url);
    println!("  llm.model: {}", config.llm.model);
    println!(
        "  llm.api_key: {}",
        if config.llm.api_key.is_some() { "<set>" } else { "<not set>" }
    );
    println!(
        "  llm timeouts (ms): classify {} / extract {} / synthesize {} / suggest {}",
        config.llm.classification_timeout_ms,
        config.llm.extraction_timeout_ms,
        config.llm.synthesis_timeout_ms,
        config.llm.suggestion_timeout_ms
    );
    println!("  search.row_limit: {}", config.search.row_limit);
    println!("  search.tier_timeout_ms: {}", config.search.tier_timeout_ms);
    println!("  search.sample_size: {}", config.search.sample_size);
    println!("  cache.pipeline_ttl_secs: {}", config.cache.pipeline_ttl_secs);
    println!("  cache.response_ttl_secs: {}", config.cache.response_ttl_secs);
    println!("  logging.level: {:?}", config.logging.level());
    println!("  logging.coloured: {}", config.logging.coloured());
    println!("  logging.output: {:?}", config.logging.output());

    println!("\nPriority: CLI args > ENV vars (RUEDAS_*) > Config file > Defaults");
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure ruedas.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
