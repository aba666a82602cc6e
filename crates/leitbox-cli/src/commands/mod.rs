//! Subcommand implementations.

pub mod add_words;
pub mod assign;
pub mod cancel;
pub mod due;
pub mod generate;
pub mod init;
pub mod review;
pub mod stats;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use leitbox_core::extractor::WordExtractor;
use leitbox_core::store::KvStore;
use leitbox_extractor::config::{create_extractor, load_config_from, LeitboxConfig};
use leitbox_store::JsonFileStore;

/// Load config and open the JSON store it points at.
pub(crate) fn open(config_path: Option<&Path>) -> Result<(LeitboxConfig, Arc<dyn KvStore>)> {
    let config = load_config_from(config_path)?;
    let store = JsonFileStore::open(&config.data_path)
        .with_context(|| format!("failed to open store at {}", config.data_path.display()))?;
    Ok((config, Arc::new(store)))
}

/// Build the configured default extractor.
pub(crate) fn default_extractor(config: &LeitboxConfig) -> Result<Arc<dyn WordExtractor>> {
    let econfig = config
        .extractors
        .get(&config.default_extractor)
        .with_context(|| {
            format!(
                "extractor '{}' not found in config. Available: {:?}",
                config.default_extractor,
                config.extractors.keys().collect::<Vec<_>>()
            )
        })?;
    let extractor = create_extractor(&config.default_extractor, econfig)?;
    Ok(Arc::from(extractor))
}

/// Split a comma-separated user id list.
pub(crate) fn parse_users(users: &str) -> Result<Vec<i64>> {
    users
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<i64>()
                .map_err(|_| anyhow::anyhow!("invalid user id: '{}'", s.trim()))
        })
        .collect()
}

/// Split a comma-separated word list, dropping blanks.
pub(crate) fn parse_words(words: &str) -> Vec<String> {
    words
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
