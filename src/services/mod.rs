//! Text enrichment services.
//!
//! The pipeline depends on three narrow capabilities, each a stateless
//! request/response call over bounded text:
//!
//! | Capability | Trait | Input |
//! |------------|-------|-------|
//! | Summarization | [`Summarizer`] | teaser, truncated by the caller |
//! | Sentiment | [`SentimentClassifier`] | teaser, truncated by the caller |
//! | Named entities | [`EntityExtractor`] | full teaser |
//!
//! Production implementations live in [`llm`] and are backed by an
//! OpenAI-compatible chat model. Tests substitute plain structs.

pub mod llm;

use crate::models::{Entity, Sentiment};
use std::error::Error;

/// Error type returned by every enrichment service.
pub type ServiceError = Box<dyn Error>;

/// Produces a short abstractive summary of a text.
pub trait Summarizer {
    /// Summarize `text` in roughly `min_len..=max_len` words.
    ///
    /// The length bounds are a request to the service; callers do not check them.
    async fn summarize(
        &self,
        text: &str,
        max_len: usize,
        min_len: usize,
    ) -> Result<String, ServiceError>;
}

/// Classifies the sentiment of a text.
pub trait SentimentClassifier {
    async fn classify_sentiment(&self, text: &str) -> Result<Sentiment, ServiceError>;
}

/// Extracts named entities from a text, in order of appearance.
pub trait EntityExtractor {
    async fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, ServiceError>;
}
