use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for ruedas.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (RUEDAS_* prefix)
/// 3. Config file (~/.config/ruedas/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite inventory.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: RUEDAS_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/ruedas/inventory.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Market region every search is restricted to when the query does not
    /// name a location.
    #[serde(default = "default_location")]
    pub default_location: String,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: twyg::Opts,
}

/// Language-model endpoint and per-call deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    pub model: String,
    /// API key. Without one the model is disabled and every stage uses its
    /// deterministic fallback.
    pub api_key: Option<String>,
    pub classification_timeout_ms: u64,
    pub extraction_timeout_ms: u64,
    pub synthesis_timeout_ms: u64,
    /// Deadline for the suggestion call and for its translation call.
    pub suggestion_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            classification_timeout_ms: 3_000,
            extraction_timeout_ms: 5_000,
            synthesis_timeout_ms: 5_000,
            suggestion_timeout_ms: 10_000,
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub const fn classification_timeout(&self) -> Duration {
        Duration::from_millis(self.classification_timeout_ms)
    }

    #[must_use]
    pub const fn extraction_timeout(&self) -> Duration {
        Duration::from_millis(self.extraction_timeout_ms)
    }

    #[must_use]
    pub const fn synthesis_timeout(&self) -> Duration {
        Duration::from_millis(self.synthesis_timeout_ms)
    }

    #[must_use]
    pub const fn suggestion_timeout(&self) -> Duration {
        Duration::from_millis(self.suggestion_timeout_ms)
    }
}

/// Tier execution limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Rows returned by any single tier.
    pub row_limit: u32,
    pub tier_timeout_ms: u64,
    /// Records handed to the response synthesizer.
    pub sample_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            row_limit: 15,
            tier_timeout_ms: 5_000,
            sample_size: 3,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn tier_timeout(&self) -> Duration {
        Duration::from_millis(self.tier_timeout_ms)
    }
}

/// Cache lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub pipeline_ttl_secs: u64,
    pub response_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            pipeline_ttl_secs: 600,
            response_ttl_secs: 1_800,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn pipeline_ttl(&self) -> Duration {
        Duration::from_secs(self.pipeline_ttl_secs)
    }

    #[must_use]
    pub const fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            default_location: default_location(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            cache: CacheConfig::default(),
            logging: twyg::Opts::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/ruedas/config.toml
    /// Reads environment variables with RUEDAS_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("ruedas");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let mut config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if config.default_location.trim().is_empty() {
            config.default_location = default_location();
        }

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }
}

/// Get the default inventory path.
///
/// Returns: ~/.local/share/ruedas/inventory.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ruedas")
        .join("inventory.db")
}

fn default_location() -> String {
    "Puerto Rico".to_string()
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/ruedas/config.toml
/// - macOS: ~/Library/Application Support/ruedas/config.toml
/// - Windows: %APPDATA%\ruedas\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ruedas")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Ruedas Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (RUEDAS_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite vehicle inventory
#
# Can also be set via:
# - CLI: ruedas --db /custom/path.db search "red car"
# - Environment: RUEDAS_DATABASE_PATH=/custom/path.db
#database_path = "/path/to/inventory.db"

# Market region applied to every search that does not name a location
default_location = "Puerto Rico"

[llm]
# Any OpenAI-compatible chat completions endpoint
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"
# Leave unset to run fully offline with deterministic fallbacks.
# OPENAI_API_KEY is used when this is not set.
#api_key = "sk-..."
classification_timeout_ms = 3000
extraction_timeout_ms = 5000
synthesis_timeout_ms = 5000
suggestion_timeout_ms = 10000

[search]
row_limit = 15
tier_timeout_ms = 5000
sample_size = 3

[cache]
pipeline_ttl_secs = 600
response_ttl_secs = 1800
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
