//! Mock extractor for testing and offline runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use leitbox_core::error::ExtractError;
use leitbox_core::extractor::{TranslateRequest, Translation, WordExtractor};

/// A mock word extractor that answers without any network call.
///
/// Unknown words get a derived `word (target)` translation, so the CLI can
/// run an end-to-end pipeline with no API key.
#[derive(Default)]
pub struct MockExtractor {
    /// Canned word → translation mappings.
    responses: HashMap<String, Translation>,
    /// Words that fail with a network error.
    failing: HashSet<String>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<TranslateRequest>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned translation for a specific word.
    pub fn with_response(mut self, word: &str, translation: &str, definition: &str) -> Self {
        self.responses.insert(
            word.to_string(),
            Translation {
                translation: translation.to_string(),
                definition: definition.to_string(),
            },
        );
        self
    }

    /// Make a word fail extraction.
    pub fn with_failure(mut self, word: &str) -> Self {
        self.failing.insert(word.to_string());
        self
    }

    /// Number of calls made to this extractor.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Last request made to this extractor.
    pub fn last_request(&self) -> Option<TranslateRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl WordExtractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<Translation, ExtractError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if self.failing.contains(&request.word) {
            return Err(ExtractError::NetworkError("mock failure".to_string()));
        }
        if let Some(t) = self.responses.get(&request.word) {
            return Ok(t.clone());
        }
        Ok(Translation {
            translation: format!("{} ({})", request.word, request.target_language),
            definition: format!("mock definition of \"{}\"", request.word),
        })
    }
}
