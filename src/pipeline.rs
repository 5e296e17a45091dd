//! Article enrichment pipeline.
//!
//! Turns each [`RawArticle`] into an [`EnrichedArticle`] or a [`SkipReason`]:
//!
//! 1. **Validate**: title and summary must both be non-blank
//! 2. **Shorten** the title
//! 3. **Summarize** the first `title_truncate_chars` characters of the summary
//! 4. **Score** sentiment on the first `sentiment_truncate_chars` characters
//! 5. **Extract** entities from the full summary, keeping allow-listed categories
//! 6. **Stamp** the capture time
//!
//! A failing step skips the article; nothing partial is emitted. Articles are
//! independent, so a batch runs them concurrently up to a fixed limit and then
//! restores source order before handing the results to the sinks.

use crate::config::PipelineConfig;
use crate::models::{EnrichedArticle, RawArticle, SentimentLabel};
use crate::services::{EntityExtractor, SentimentClassifier, ServiceError, Summarizer};
use crate::title::shorten_title;
use crate::utils::{truncate_chars, truncate_for_log};
use chrono::Local;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Timestamp format of [`EnrichedArticle::scraped_at`].
pub const SCRAPED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Field of a raw article that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleField {
    Title,
    Summary,
}

impl fmt::Display for ArticleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleField::Title => f.write_str("title"),
            ArticleField::Summary => f.write_str("summary"),
        }
    }
}

/// Enrichment service call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentStep {
    Summarize,
    ClassifySentiment,
    ExtractEntities,
}

impl fmt::Display for EnrichmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichmentStep::Summarize => f.write_str("summarize"),
            EnrichmentStep::ClassifySentiment => f.write_str("classify_sentiment"),
            EnrichmentStep::ExtractEntities => f.write_str("extract_entities"),
        }
    }
}

/// Why an article was left out of the output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    /// The listing item had no usable title or summary.
    #[error("missing {0}")]
    MissingField(ArticleField),
    /// An enrichment service failed, timed out or replied with garbage.
    #[error("{step} failed: {message}")]
    EnrichmentFailed {
        step: EnrichmentStep,
        message: String,
    },
}

/// Per-article knobs, derived from [`PipelineConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentSettings {
    pub max_title_words: usize,
    pub summary_max_len: usize,
    pub summary_min_len: usize,
    pub summary_truncate_chars: usize,
    pub sentiment_truncate_chars: usize,
    pub call_timeout: Duration,
    pub concurrency: usize,
}

impl From<&PipelineConfig> for EnrichmentSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_title_words: config.max_title_words,
            summary_max_len: config.summary_max_len,
            summary_min_len: config.summary_min_len,
            summary_truncate_chars: config.title_truncate_chars,
            sentiment_truncate_chars: config.sentiment_truncate_chars,
            call_timeout: config.call_timeout(),
            concurrency: config.concurrency,
        }
    }
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// Result of enriching one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Enriched articles in source order.
    pub articles: Vec<EnrichedArticle>,
    /// Raw articles received.
    pub found: usize,
    pub skipped_missing_field: usize,
    pub skipped_enrichment_failed: usize,
}

impl BatchOutcome {
    pub fn skipped(&self) -> usize {
        self.skipped_missing_field + self.skipped_enrichment_failed
    }
}

/// The enrichment services plus settings, built once and shared read-only by
/// every article of a run.
#[derive(Debug)]
pub struct EnrichmentContext<S, C, E> {
    summarizer: S,
    sentiment: C,
    entities: E,
    settings: EnrichmentSettings,
}

impl<S, C, E> EnrichmentContext<S, C, E>
where
    S: Summarizer,
    C: SentimentClassifier,
    E: EntityExtractor,
{
    pub fn new(summarizer: S, sentiment: C, entities: E, settings: EnrichmentSettings) -> Self {
        Self {
            summarizer,
            sentiment,
            entities,
            settings,
        }
    }

    pub fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    /// Enrich a single article.
    pub async fn enrich(&self, raw: &RawArticle) -> Result<EnrichedArticle, SkipReason> {
        let title = raw.title.trim();
        let summary = raw.summary.trim();
        if title.is_empty() {
            return Err(SkipReason::MissingField(ArticleField::Title));
        }
        if summary.is_empty() {
            return Err(SkipReason::MissingField(ArticleField::Summary));
        }

        let short_title = shorten_title(title, self.settings.max_title_words);

        let ai_insight = self
            .call(
                EnrichmentStep::Summarize,
                self.summarizer.summarize(
                    truncate_chars(summary, self.settings.summary_truncate_chars),
                    self.settings.summary_max_len,
                    self.settings.summary_min_len,
                ),
            )
            .await?;

        let sentiment = self
            .call(
                EnrichmentStep::ClassifySentiment,
                self.sentiment.classify_sentiment(truncate_chars(
                    summary,
                    self.settings.sentiment_truncate_chars,
                )),
            )
            .await?;
        if !(0.0..=1.0).contains(&sentiment.score) {
            return Err(SkipReason::EnrichmentFailed {
                step: EnrichmentStep::ClassifySentiment,
                message: format!("score {} outside [0, 1]", sentiment.score),
            });
        }

        let entities = self
            .call(
                EnrichmentStep::ExtractEntities,
                self.entities.extract_entities(summary),
            )
            .await?
            .into_iter()
            .filter(|entity| {
                let keep = entity.category.is_allowed();
                if !keep {
                    debug!(entity = %entity.text, category = ?entity.category, "Dropping entity");
                }
                keep
            })
            .map(|entity| entity.text)
            .collect();

        Ok(EnrichedArticle {
            short_title,
            ai_insight,
            entities,
            sentiment_label: sentiment.label,
            sentiment_score: round_score(sentiment.score),
            scraped_at: Local::now().format(SCRAPED_AT_FORMAT).to_string(),
        })
    }

    /// Run one service call under the per-call timeout.
    async fn call<T, F>(&self, step: EnrichmentStep, fut: F) -> Result<T, SkipReason>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        match timeout(self.settings.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(SkipReason::EnrichmentFailed {
                step,
                message: e.to_string(),
            }),
            Err(_) => Err(SkipReason::EnrichmentFailed {
                step,
                message: format!("timed out after {:?}", self.settings.call_timeout),
            }),
        }
    }

    /// Enrich a batch of articles, at most `concurrency` at a time.
    ///
    /// Each article is tagged with its source index; results are re-sorted by
    /// that index, so the output order matches the input order regardless of
    /// completion order. Skipped articles are logged and counted.
    #[instrument(level = "info", skip_all, fields(concurrency = self.settings.concurrency))]
    pub async fn enrich_all<I>(&self, raws: I) -> BatchOutcome
    where
        I: IntoIterator<Item = RawArticle>,
    {
        let mut results: Vec<(usize, RawArticle, Result<EnrichedArticle, SkipReason>)> =
            stream::iter(raws.into_iter().enumerate())
                .map(|(index, raw)| async move {
                    debug!(index, title = %truncate_for_log(&raw.title, 80), "Enriching article");
                    let result = self.enrich(&raw).await;
                    (index, raw, result)
                })
                .buffer_unordered(self.settings.concurrency.max(1))
                .collect()
                .await;
        results.sort_by_key(|(index, _, _)| *index);

        let mut outcome = BatchOutcome {
            found: results.len(),
            ..BatchOutcome::default()
        };
        for (index, raw, result) in results {
            match result {
                Ok(article) => outcome.articles.push(article),
                Err(reason @ SkipReason::MissingField(_)) => {
                    outcome.skipped_missing_field += 1;
                    warn!(
                        index,
                        title = %truncate_for_log(&raw.title, 80),
                        reason = %reason,
                        "Skipping article with missing field"
                    );
                }
                Err(reason @ SkipReason::EnrichmentFailed { .. }) => {
                    outcome.skipped_enrichment_failed += 1;
                    warn!(
                        index,
                        title = %truncate_for_log(&raw.title, 80),
                        reason = %reason,
                        "Skipping article; enrichment failed"
                    );
                }
            }
        }

        info!(
            found = outcome.found,
            processed = outcome.articles.len(),
            skipped = outcome.skipped(),
            missing_field = outcome.skipped_missing_field,
            enrichment_failed = outcome.skipped_enrichment_failed,
            "Batch enrichment complete"
        );
        outcome
    }
}

/// Round a confidence score to 4 decimal places.
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// Count enriched articles per sentiment label.
///
/// Only labels that occur are present; the map iterates in label order.
pub fn tally_labels(articles: &[EnrichedArticle]) -> BTreeMap<SentimentLabel, usize> {
    articles
        .iter()
        .map(|article| article.sentiment_label)
        .counts()
        .into_iter()
        .collect()
}
