//! The word extractor seam.
//!
//! Implemented by the `leitbox-extractor` crate for real backends and mocks.
//! The bulk coordinator is the only consumer; it treats every failure as
//! recoverable per word.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Trait for backends that translate and define a single word.
#[async_trait]
pub trait WordExtractor: Send + Sync {
    /// Human-readable backend name (e.g. "openai").
    fn name(&self) -> &str;

    /// Translate and define one word.
    async fn translate(&self, request: &TranslateRequest) -> Result<Translation, ExtractError>;
}

/// Request to translate one word.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    /// The word to translate.
    pub word: String,
    /// Language the word is in (e.g. "en").
    pub source_language: String,
    /// Language to translate into (e.g. "es").
    pub target_language: String,
}

/// A translation plus definition for one word.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    /// Translation in the target language.
    pub translation: String,
    /// Short definition in the target language.
    #[serde(default)]
    pub definition: String,
}
