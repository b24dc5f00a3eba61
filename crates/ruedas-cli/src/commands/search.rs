use anyhow::{Context, Result};

use ruedas_search::{Config, SearchResponse, SearchService};

pub async fn run_search(config: &Config, query: &str, json: bool) -> Result<()> {
    let service = SearchService::from_config(config).context("Failed to set up search")?;
    let response = service.search(query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    Ok(())
}

/// Human-readable rendering shared with the REPL.
pub fn print_response(response: &SearchResponse) {
    println!("\n{}\n", response.response);

    for (i, vehicle) in response.vehicles.iter().enumerate() {
        let place = vehicle.address.as_deref().unwrap_or(&vehicle.location);
        println!("  {:>2}. {}  ({})", i + 1, vehicle.summary(), place);
    }

    if let Some(suggestions) = &response.suggestions {
        println!("  {}\n", suggestions.analysis);
        if !suggestions.alternative_searches.is_empty() {
            println!("  Try:");
            for alternative in &suggestions.alternative_searches {
                println!("    - {}", alternative.description);
            }
        }
        for question in &suggestions.follow_up_questions {
            println!("  ? {question}");
        }
    }

    println!(
        "\n  {} results · {} tier · {} · {}ms",
        response.total_results, response.tier, response.language, response.processing_time_ms
    );
}
