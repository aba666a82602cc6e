//! The `leitbox add-words` command — generate and assign in one step.

use std::path::PathBuf;

use anyhow::Result;

use leitbox_core::assignment::BulkCoordinator;

pub async fn execute(
    words: String,
    users: String,
    source: Option<String>,
    target: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let words = super::parse_words(&words);
    anyhow::ensure!(!words.is_empty(), "no words given");
    let users = super::parse_users(&users)?;
    anyhow::ensure!(!users.is_empty(), "no users given");

    let (config, store) = super::open(config_path.as_deref())?;
    let extractor = super::default_extractor(&config)?;
    let source = source.unwrap_or_else(|| config.source_language.clone());
    let target = target.unwrap_or_else(|| config.target_language.clone());

    let coordinator = BulkCoordinator::new(store, extractor, config.coordinator_config());
    let now = chrono::Utc::now();

    let generated = coordinator.generate(&words, &source, &target, now).await?;
    println!(
        "Generated {} candidates ({} translated, {} fallback).",
        generated.assignment.candidates.len(),
        generated.success_count,
        generated.failure_count
    );

    let assigned = coordinator
        .assign(generated.assignment.id, &users, now)
        .await?;
    println!(
        "Created {} cards across {} users ({} already present).",
        assigned.created,
        users.len(),
        assigned.skipped
    );
    Ok(())
}
