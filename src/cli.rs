//! Command-line interface definitions.
//!
//! Every flag is optional; unset flags fall back to the config file (if one is
//! given) and then to the built-in defaults of [`crate::config::PipelineConfig`].

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for a single scrape-and-enrich run.
///
/// # Examples
///
/// ```sh
/// # Defaults: moneycontrol markets listing, ./output
/// finance_news_ai
///
/// # Custom config file and output directory
/// finance_news_ai -c run.yaml -o ~/Desktop
///
/// # Sequential processing against a different LLM client config
/// finance_news_ai --concurrency 1 --llm-config ./aj/config.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML pipeline config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory for the CSV table and sentiment chart
    #[arg(short, long, env = "FINANCE_NEWS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Listing page to scrape
    #[arg(long)]
    pub source_url: Option<String>,

    /// Maximum number of articles enriched concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Path to the LLM client config.yaml
    #[arg(long, env = "FINANCE_NEWS_LLM_CONFIG")]
    pub llm_config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["finance_news_ai"]);
        assert!(cli.config.is_none());
        assert!(cli.source_url.is_none());
        assert!(cli.concurrency.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["finance_news_ai", "-c", "run.yaml", "-o", "/tmp/news"]);

        assert_eq!(cli.config, Some(PathBuf::from("run.yaml")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/news")));
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "finance_news_ai",
            "--source-url",
            "https://example.com/markets/",
            "--concurrency",
            "2",
        ]);

        assert_eq!(cli.source_url.as_deref(), Some("https://example.com/markets/"));
        assert_eq!(cli.concurrency, Some(2));
    }
}
