//! The `leitbox stats` command — dashboard counters.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use leitbox_core::counter::DashboardStats;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let (_config, store) = super::open(config_path.as_deref())?;

    let stats = DashboardStats::load(store.as_ref(), chrono::Utc::now()).await?;

    let mut table = Table::new();
    table.set_header(vec!["Counter", "Value"]);
    table.add_row(vec!["Cards".to_string(), stats.cards.to_string()]);
    table.add_row(vec!["Reviews".to_string(), stats.reviews.to_string()]);
    table.add_row(vec![
        "Reviews today".to_string(),
        stats.reviews_today.to_string(),
    ]);
    table.add_row(vec![
        "Assignments".to_string(),
        stats.assignments.to_string(),
    ]);
    println!("{table}");
    Ok(())
}
