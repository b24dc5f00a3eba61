use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

use ruedas_search::{Config, SearchService};

use super::search::print_response;

pub async fn run_repl(config: &Config) -> Result<()> {
    let service = SearchService::from_config(config).context("Failed to set up search")?;

    println!("ruedas: describe the vehicle you want (:clear, :quit)");
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "" => {}
            ":quit" | ":q" | ":exit" => {
                log::debug!("Leaving repl");
                break;
            }
            ":clear" => {
                service.clear_caches();
                println!("Caches cleared.");
            }
            query => {
                let response = service.search(query).await;
                print_response(&response);
            }
        }
    }

    Ok(())
}
