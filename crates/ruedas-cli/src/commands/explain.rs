use anyhow::{Context, Result};

use ruedas_search::{Config, SearchService};

/// Print language scores, intent, extracted parameters and the SQL of
/// every tier for a query.
pub async fn run_explain(config: &Config, query: &str) -> Result<()> {
    let service = SearchService::from_config(config).context("Failed to set up search")?;
    let explanation = service.explain(query).await;

    println!("\nQuery: {:?}", explanation.query.normalized_text);
    println!(
        "Language: {} (en {} / es {})",
        explanation.query.language.name(),
        explanation.scores.english,
        explanation.scores.spanish
    );
    println!(
        "Vehicle search: {} (via {:?})",
        if explanation.intent.is_vehicle { "yes" } else { "no" },
        explanation.intent.source
    );

    let Some(extraction) = &explanation.extraction else {
        println!("\nNot a vehicle search; nothing would be queried.");
        return Ok(());
    };

    println!(
        "\nParameters ({:?}, {:?}):",
        extraction.source, extraction.query_type
    );
    println!("{}", serde_json::to_string_pretty(&extraction.params)?);
    for rejected in &extraction.rejected {
        println!("  {:?} skipped: {}", rejected.strategy, rejected.reason);
    }

    for plan in &explanation.plans {
        println!("\n[{}]", plan.tier);
        println!("  {}", plan.sql);
        for (i, value) in plan.params.iter().enumerate() {
            println!("    ?{} = {}", i + 1, value);
        }
    }

    Ok(())
}
