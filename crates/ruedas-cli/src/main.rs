use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use ruedas_search::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "ruedas", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the inventory database (default: ~/.local/share/ruedas/inventory.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Search the inventory with a natural-language query
    ///
    /// Queries may be written in English or Spanish:
    ///
    /// - "red Toyota under $20,000"
    /// - "jeepeta roja en Ponce"
    /// - "8 cylinder truck 2018 or newer"
    ///
    /// The query is classified, turned into filters and run against the
    /// inventory in up to three progressively looser tiers. When nothing
    /// matches, alternative searches and follow-up questions are shown.
    ///
    /// Without a language-model API key every stage uses its deterministic
    /// fallback.
    Search {
        /// The query text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how a query would be interpreted, without searching
    Explain {
        /// The query text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Interactive search session
    ///
    /// Commands: :clear drops cached results, :quit exits.
    Repl,
    /// Import vehicle listings from a JSON file into the inventory
    Import {
        /// JSON array of vehicle records
        path: PathBuf,
    },
    /// Show inventory and configuration status
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

fn load_config(db: Option<PathBuf>) -> Result<Config> {
    match db {
        Some(path) => Config::load_with_db_path(path),
        None => Config::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.db).context("Failed to load configuration")?;

    twyg::setup(config.logging.clone())
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {e:?}"))?;

    match cli.command {
        Commands::Search { query, json } => {
            commands::run_search(&config, &query.join(" "), json).await?;
        }
        Commands::Explain { query } => {
            commands::run_explain(&config, &query.join(" ")).await?;
        }
        Commands::Repl => {
            commands::run_repl(&config).await?;
        }
        Commands::Import { path } => {
            commands::run_import(&config, &path)?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config),
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_query_words_and_global_db() {
        let cli = Cli::parse_from(["ruedas", "search", "red", "car", "--json", "--db", "x.db"]);
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        match cli.command {
            Commands::Search { query, json } => {
                assert_eq!(query.join(" "), "red car");
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
