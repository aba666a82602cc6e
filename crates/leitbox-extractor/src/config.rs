//! Application configuration and extractor factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use leitbox_core::assignment::CoordinatorConfig;
use leitbox_core::extractor::WordExtractor;
use leitbox_core::scheduler::BoxIntervals;
use leitbox_core::session::SessionConfig;

use crate::mock::MockExtractor;
use crate::openai::OpenAiExtractor;

/// Configuration for a single word extractor backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in
/// logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtractorConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
    Mock,
}

impl std::fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractorConfig::OpenAI {
                api_key: _,
                model,
                base_url,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .finish(),
            ExtractorConfig::Mock => f.debug_struct("Mock").finish(),
        }
    }
}

/// Top-level leitbox configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeitboxConfig {
    /// Extractor configurations keyed by name.
    #[serde(default)]
    pub extractors: HashMap<String, ExtractorConfig>,
    /// Default extractor to use.
    #[serde(default = "default_extractor")]
    pub default_extractor: String,
    /// Language words arrive in.
    #[serde(default = "default_source_language")]
    pub source_language: String,
    /// Language to translate into.
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Path of the JSON store file.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    /// Review interval per box, in minutes, box 1 first.
    #[serde(default = "default_box_intervals")]
    pub box_interval_minutes: [u64; 5],
    /// Minutes of inactivity before a session behaves as cancelled.
    #[serde(default = "default_idle_minutes")]
    pub session_idle_minutes: u64,
    /// Minutes a pending bulk assignment stays consumable.
    #[serde(default = "default_retention_minutes")]
    pub assignment_retention_minutes: u64,
    /// Bound on each extractor call, in seconds.
    #[serde(default = "default_extract_timeout")]
    pub extract_timeout_secs: u64,
}

fn default_extractor() -> String {
    "openai".to_string()
}
fn default_source_language() -> String {
    "en".to_string()
}
fn default_target_language() -> String {
    "es".to_string()
}
fn default_data_path() -> PathBuf {
    PathBuf::from("./leitbox-data/store.json")
}
fn default_box_intervals() -> [u64; 5] {
    [10, 1_440, 4_320, 10_080, 30_240]
}
fn default_idle_minutes() -> u64 {
    30
}
fn default_retention_minutes() -> u64 {
    30
}
fn default_extract_timeout() -> u64 {
    20
}

impl Default for LeitboxConfig {
    fn default() -> Self {
        Self {
            extractors: HashMap::new(),
            default_extractor: default_extractor(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            data_path: default_data_path(),
            box_interval_minutes: default_box_intervals(),
            session_idle_minutes: default_idle_minutes(),
            assignment_retention_minutes: default_retention_minutes(),
            extract_timeout_secs: default_extract_timeout(),
        }
    }
}

impl LeitboxConfig {
    /// Box interval table from the configured minutes.
    pub fn intervals(&self) -> BoxIntervals {
        BoxIntervals::from_minutes(self.box_interval_minutes)
    }

    /// Session manager configuration derived from this config.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            intervals: self.intervals(),
            idle_timeout: chrono::Duration::minutes(self.session_idle_minutes as i64),
        }
    }

    /// Bulk coordinator configuration derived from this config.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            retention: chrono::Duration::minutes(self.assignment_retention_minutes as i64),
            extract_timeout: std::time::Duration::from_secs(self.extract_timeout_secs),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in an extractor config.
fn resolve_extractor_config(config: &ExtractorConfig) -> ExtractorConfig {
    match config {
        ExtractorConfig::OpenAI {
            api_key,
            model,
            base_url,
        } => ExtractorConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            model: model.clone(),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ExtractorConfig::Mock => ExtractorConfig::Mock,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `leitbox.toml` in the current directory
/// 2. `~/.config/leitbox/config.toml`
///
/// Environment variable override: `LEITBOX_OPENAI_KEY`.
pub fn load_config() -> Result<LeitboxConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LeitboxConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("leitbox.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<LeitboxConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => LeitboxConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("LEITBOX_OPENAI_KEY") {
        config
            .extractors
            .entry("openai".into())
            .or_insert(ExtractorConfig::OpenAI {
                api_key: String::new(),
                model: None,
                base_url: None,
            });
        if let Some(ExtractorConfig::OpenAI { api_key, .. }) = config.extractors.get_mut("openai")
        {
            *api_key = key;
        }
    }

    // Resolve env vars in all extractor configs
    let resolved: HashMap<String, ExtractorConfig> = config
        .extractors
        .iter()
        .map(|(k, v)| (k.clone(), resolve_extractor_config(v)))
        .collect();
    config.extractors = resolved;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("leitbox"))
}

/// Create an extractor instance from its configuration.
pub fn create_extractor(name: &str, config: &ExtractorConfig) -> Result<Box<dyn WordExtractor>> {
    tracing::debug!(name, "creating extractor");
    match config {
        ExtractorConfig::OpenAI {
            api_key,
            model,
            base_url,
        } => Ok(Box::new(OpenAiExtractor::new(
            api_key,
            model.clone(),
            base_url.clone(),
        ))),
        ExtractorConfig::Mock => Ok(Box::new(MockExtractor::new())),
    }
}
