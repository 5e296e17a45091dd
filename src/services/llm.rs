//! LLM-backed enrichment services.
//!
//! Each service owns one `awful_aj` chat template and shares the client
//! configuration with the others. The template carries the system prompt; the
//! service adds a short task line and expects a JSON object in reply:
//!
//! | Service | Template (default) | Reply |
//! |---------|--------------------|-------|
//! | [`LlmSummarizer`] | `finance_summarizer` | `{"summary": "..."}` |
//! | [`LlmSentimentClassifier`] | `finance_sentiment` | `{"label": "POSITIVE", "score": 0.97}` |
//! | [`LlmEntityExtractor`] | `finance_entities` | `{"entities": [{"text": "RBI", "category": "ORG"}]}` |
//!
//! Replies wrapped in Markdown code fences are accepted. Anything that does
//! not match the expected shape is reported as a service error.

use crate::api::ask_with_backoff;
use crate::config::PipelineConfig;
use crate::models::{Entity, Sentiment};
use crate::services::{EntityExtractor, SentimentClassifier, ServiceError, Summarizer};
use crate::utils::truncate_for_log;
use awful_aj::{config, config::AwfulJadeConfig, config_dir, template, template::ChatTemplate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument};

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").unwrap());

/// Shared client state: model config plus one template.
#[derive(Debug)]
struct LlmEndpoint {
    config: Arc<AwfulJadeConfig>,
    template: ChatTemplate,
    max_retries: usize,
}

impl LlmEndpoint {
    async fn ask(&self, text: &str) -> Result<String, ServiceError> {
        ask_with_backoff(&self.config, &self.template, text, self.max_retries).await
    }
}

/// The three production services, built once per run.
#[derive(Debug)]
pub struct LlmServices {
    pub summarizer: LlmSummarizer,
    pub sentiment: LlmSentimentClassifier,
    pub entities: LlmEntityExtractor,
}

impl LlmServices {
    /// Load the client config and the three templates named in `pipeline`.
    #[instrument(level = "info", skip_all)]
    pub async fn load(pipeline: &PipelineConfig) -> Result<Self, ServiceError> {
        let conf_file = match &pipeline.llm_config {
            Some(path) => path.clone(),
            None => config_dir()?.join("config.yaml"),
        };
        let config_path = conf_file
            .to_str()
            .ok_or_else(|| format!("LLM config path is not valid UTF-8: {}", conf_file.display()))?;
        let llm_config = config::load_config(config_path)
            .map_err(|e| format!("failed to load LLM config {config_path}: {e}"))?;
        info!(config_path, "Loaded LLM configuration");
        let llm_config = Arc::new(llm_config);

        let endpoint = |template: ChatTemplate| LlmEndpoint {
            config: Arc::clone(&llm_config),
            template,
            max_retries: pipeline.llm_max_retries,
        };

        Ok(Self {
            summarizer: LlmSummarizer(endpoint(
                load_named_template(&pipeline.summarizer_template).await?,
            )),
            sentiment: LlmSentimentClassifier(endpoint(
                load_named_template(&pipeline.sentiment_template).await?,
            )),
            entities: LlmEntityExtractor(endpoint(
                load_named_template(&pipeline.entities_template).await?,
            )),
        })
    }
}

async fn load_named_template(name: &str) -> Result<ChatTemplate, ServiceError> {
    let loaded = template::load_template(name)
        .await
        .map_err(|e| format!("failed to load template {name}: {e}"))?;
    info!(template = name, "Loaded template");
    Ok(loaded)
}

/// Summarizer backed by the `finance_summarizer` template.
#[derive(Debug)]
pub struct LlmSummarizer(LlmEndpoint);

/// Sentiment classifier backed by the `finance_sentiment` template.
#[derive(Debug)]
pub struct LlmSentimentClassifier(LlmEndpoint);

/// Entity extractor backed by the `finance_entities` template.
#[derive(Debug)]
pub struct LlmEntityExtractor(LlmEndpoint);

impl Summarizer for LlmSummarizer {
    #[instrument(level = "debug", skip_all, fields(chars = text.chars().count()))]
    async fn summarize(
        &self,
        text: &str,
        max_len: usize,
        min_len: usize,
    ) -> Result<String, ServiceError> {
        let prompt = format!(
            "Summarize the following finance news text in {min_len} to {max_len} words. \
             Reply only with JSON of the form {{\"summary\": \"...\"}}.\n\n{text}"
        );
        let reply = self.0.ask(&prompt).await?;
        parse_summary(&reply)
    }
}

impl SentimentClassifier for LlmSentimentClassifier {
    #[instrument(level = "debug", skip_all, fields(chars = text.chars().count()))]
    async fn classify_sentiment(&self, text: &str) -> Result<Sentiment, ServiceError> {
        let prompt = format!(
            "Classify the sentiment of the following finance news text as POSITIVE, NEGATIVE \
             or NEUTRAL with a confidence between 0 and 1. Reply only with JSON of the form \
             {{\"label\": \"POSITIVE\", \"score\": 0.0}}.\n\n{text}"
        );
        let reply = self.0.ask(&prompt).await?;
        parse_sentiment(&reply)
    }
}

impl EntityExtractor for LlmEntityExtractor {
    #[instrument(level = "debug", skip_all, fields(chars = text.chars().count()))]
    async fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, ServiceError> {
        let prompt = format!(
            "List the named entities in the following text in order of appearance, \
             tagging each with ORG, GPE, LOC, MONEY, PERSON, DATE, PERCENT or OTHER. \
             Reply only with JSON of the form \
             {{\"entities\": [{{\"text\": \"...\", \"category\": \"ORG\"}}]}}.\n\n{text}"
        );
        let reply = self.0.ask(&prompt).await?;
        parse_entities(&reply)
    }
}

/// Remove a surrounding Markdown code fence, if any.
fn strip_code_fence(reply: &str) -> &str {
    match CODE_FENCE.captures(reply).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => reply.trim(),
    }
}

fn parse_reply<T: DeserializeOwned>(reply: &str, what: &str) -> Result<T, ServiceError> {
    let body = strip_code_fence(reply);
    serde_json::from_str(body).map_err(|e| {
        debug!(reply = %truncate_for_log(reply, 300), "Non-conforming model reply");
        format!("malformed {what} reply: {e}").into()
    })
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    summary: String,
}

#[derive(Debug, Deserialize)]
struct EntitiesReply {
    entities: Vec<Entity>,
}

fn parse_summary(reply: &str) -> Result<String, ServiceError> {
    let parsed: SummaryReply = parse_reply(reply, "summary")?;
    let summary = parsed.summary.trim();
    if summary.is_empty() {
        return Err("model returned an empty summary".into());
    }
    Ok(summary.to_string())
}

fn parse_sentiment(reply: &str) -> Result<Sentiment, ServiceError> {
    let sentiment: Sentiment = parse_reply(reply, "sentiment")?;
    if !(0.0..=1.0).contains(&sentiment.score) {
        return Err(format!("sentiment score {} outside [0, 1]", sentiment.score).into());
    }
    Ok(sentiment)
}

fn parse_entities(reply: &str) -> Result<Vec<Entity>, ServiceError> {
    let parsed: EntitiesReply = parse_reply(reply, "entities")?;
    Ok(parsed.entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityCategory, SentimentLabel};

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_summary() {
        let summary = parse_summary(r#"{"summary": "  RBI cut rates by 25 bps.  "}"#).unwrap();
        assert_eq!(summary, "RBI cut rates by 25 bps.");
    }

    #[test]
    fn test_parse_summary_rejects_empty() {
        assert!(parse_summary(r#"{"summary": "   "}"#).is_err());
    }

    #[test]
    fn test_parse_summary_rejects_truncated_json() {
        let err = parse_summary(r#"{"summary": "RBI cut"#).unwrap_err();
        assert!(err.to_string().contains("malformed summary reply"));
    }

    #[test]
    fn test_parse_sentiment_fenced() {
        let sentiment =
            parse_sentiment("```json\n{\"label\": \"NEGATIVE\", \"score\": 0.912}\n```").unwrap();
        assert_eq!(sentiment.label, SentimentLabel::Negative);
        assert!((sentiment.score - 0.912).abs() < 1e-12);
    }

    #[test]
    fn test_parse_sentiment_rejects_out_of_range_score() {
        assert!(parse_sentiment(r#"{"label": "POSITIVE", "score": 1.7}"#).is_err());
        assert!(parse_sentiment(r#"{"label": "POSITIVE", "score": -0.1}"#).is_err());
    }

    #[test]
    fn test_parse_sentiment_rejects_unknown_label() {
        assert!(parse_sentiment(r#"{"label": "BULLISH", "score": 0.8}"#).is_err());
    }

    #[test]
    fn test_parse_entities_preserves_order() {
        let entities = parse_entities(
            r#"{"entities": [
                {"text": "Reliance Industries", "category": "ORG"},
                {"text": "Rs 1,200 crore", "category": "MONEY"},
                {"text": "Reliance Industries", "category": "ORG"},
                {"text": "Q3", "category": "DATE"}
            ]}"#,
        )
        .unwrap();

        let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Reliance Industries", "Rs 1,200 crore", "Reliance Industries", "Q3"]
        );
        assert_eq!(entities[3].category, EntityCategory::Date);
    }

    #[test]
    fn test_parse_entities_requires_list() {
        assert!(parse_entities(r#"{"names": []}"#).is_err());
        assert!(parse_entities(r#"{"entities": []}"#).unwrap().is_empty());
    }
}
