//! Run configuration.
//!
//! [`PipelineConfig`] gathers every tunable of a run: title compaction,
//! model input caps, summary length bounds, concurrency, the listing URL and
//! the output directory. It is read from an optional YAML file and then
//! overridden by command-line flags (see [`crate::cli::Cli`]).
//!
//! ```yaml
//! max_title_words: 12
//! summary_max_len: 40
//! summary_min_len: 10
//! title_truncate_chars: 1024
//! sentiment_truncate_chars: 512
//! output_dir: ./output
//! concurrency: 4
//! call_timeout_secs: 120
//! ```

use crate::cli::Cli;
use crate::title::DEFAULT_MAX_TITLE_WORDS;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_SOURCE_URL: &str = "https://www.moneycontrol.com/news/business/markets/";

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// All recognized options for a run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Word cap applied by the title shortener.
    pub max_title_words: usize,
    /// Upper summary length bound passed to the summarizer.
    pub summary_max_len: usize,
    /// Lower summary length bound passed to the summarizer.
    pub summary_min_len: usize,
    /// Characters of the teaser sent to the summarizer.
    #[serde(alias = "summary_truncate_chars")]
    pub title_truncate_chars: usize,
    /// Characters of the teaser sent to the sentiment classifier.
    pub sentiment_truncate_chars: usize,
    /// Directory receiving the CSV table and the chart.
    pub output_dir: PathBuf,
    /// Listing page to scrape.
    pub source_url: String,
    pub user_agent: String,
    /// Maximum number of articles enriched at once.
    pub concurrency: usize,
    /// Timeout applied to each individual enrichment service call.
    pub call_timeout_secs: u64,
    /// Transport retries per service call (0 = single attempt).
    pub llm_max_retries: usize,
    pub summarizer_template: String,
    pub sentiment_template: String,
    pub entities_template: String,
    /// Path to the LLM client config.yaml; defaults to the client's config dir.
    pub llm_config: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_title_words: DEFAULT_MAX_TITLE_WORDS,
            summary_max_len: 40,
            summary_min_len: 10,
            title_truncate_chars: 1024,
            sentiment_truncate_chars: 512,
            output_dir: PathBuf::from("output"),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            concurrency: 4,
            call_timeout_secs: 120,
            llm_max_retries: 0,
            summarizer_template: "finance_summarizer".to_string(),
            sentiment_template: "finance_sentiment".to_string(),
            entities_template: "finance_entities".to_string(),
            llm_config: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Read and parse a YAML config file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded pipeline configuration");
        Ok(config)
    }

    /// Build the effective configuration for a run: file (if any), then CLI
    /// overrides, then validation.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(url) = &cli.source_url {
            self.source_url = url.clone();
        }
        if let Some(n) = cli.concurrency {
            self.concurrency = n;
        }
        if let Some(path) = &cli.llm_config {
            self.llm_config = Some(path.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_title_words", self.max_title_words),
            ("title_truncate_chars", self.title_truncate_chars),
            ("sentiment_truncate_chars", self.sentiment_truncate_chars),
            ("concurrency", self.concurrency),
            ("call_timeout_secs", self.call_timeout_secs as usize),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
        }
        if self.summary_min_len > self.summary_max_len {
            return Err(ConfigError::Invalid(format!(
                "summary_min_len ({}) exceeds summary_max_len ({})",
                self.summary_min_len, self.summary_max_len
            )));
        }
        Url::parse(&self.source_url)
            .map_err(|e| ConfigError::Invalid(format!("source_url {:?}: {e}", self.source_url)))?;
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}
