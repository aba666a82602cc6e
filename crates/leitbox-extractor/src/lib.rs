//! leitbox-extractor — word extractor backends.
//!
//! Implements the `WordExtractor` trait from `leitbox-core` for an
//! OpenAI-compatible chat endpoint and a mock backend, and owns the
//! application configuration layer.

pub mod config;
pub mod mock;
pub mod openai;

pub use config::{create_extractor, load_config, ExtractorConfig, LeitboxConfig};
pub use leitbox_core::error::ExtractError;
pub use mock::MockExtractor;
pub use openai::OpenAiExtractor;
