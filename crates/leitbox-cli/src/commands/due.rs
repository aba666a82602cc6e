//! The `leitbox due` command — list a user's currently due cards.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use leitbox_core::session::SessionManager;

pub async fn execute(user: i64, config_path: Option<PathBuf>) -> Result<()> {
    let (config, store) = super::open(config_path.as_deref())?;
    let manager = SessionManager::new(store, config.session_config());

    let now = chrono::Utc::now();
    let mut due = manager.due_cards(user, now).await?;
    if due.is_empty() {
        println!("No words due right now for user {user} — all caught up.");
        return Ok(());
    }
    due.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.id.cmp(&b.id)));

    let mut table = Table::new();
    table.set_header(vec!["Word", "Box", "Due since", "Reviews", "Correct"]);
    for card in &due {
        table.add_row(vec![
            card.word.clone(),
            card.box_level.to_string(),
            card.due_at.format("%Y-%m-%d %H:%M").to_string(),
            card.total_reviews.to_string(),
            card.correct_reviews.to_string(),
        ]);
    }
    println!("{table}");
    println!("\n{} cards due for user {user}.", due.len());
    Ok(())
}
