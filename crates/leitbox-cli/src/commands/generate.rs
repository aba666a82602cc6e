//! The `leitbox generate` command — stage a word batch for later assignment.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use leitbox_core::assignment::{BulkCoordinator, GenerateOutcome};

pub async fn execute(
    words: String,
    source: Option<String>,
    target: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let words = super::parse_words(&words);
    anyhow::ensure!(!words.is_empty(), "no words given");

    let (config, store) = super::open(config_path.as_deref())?;
    let extractor = super::default_extractor(&config)?;
    let source = source.unwrap_or_else(|| config.source_language.clone());
    let target = target.unwrap_or_else(|| config.target_language.clone());

    let coordinator = BulkCoordinator::new(store, extractor, config.coordinator_config());
    let outcome = coordinator
        .generate(&words, &source, &target, chrono::Utc::now())
        .await?;

    print_outcome(&outcome);
    println!(
        "\nStaged assignment {} ({} translated, {} fallback).",
        outcome.assignment.id, outcome.success_count, outcome.failure_count
    );
    println!(
        "Apply it with: leitbox assign --assignment {} --users <ids>",
        outcome.assignment.id
    );
    Ok(())
}

fn print_outcome(outcome: &GenerateOutcome) {
    let mut table = Table::new();
    table.set_header(vec!["Word", "Translation", "Definition", "Source"]);
    for candidate in &outcome.assignment.candidates {
        table.add_row(vec![
            candidate.word.clone(),
            candidate.translation.clone(),
            candidate.definition.clone(),
            if candidate.fallback {
                "fallback".to_string()
            } else {
                "extractor".to_string()
            },
        ]);
    }
    println!("{table}");
}
