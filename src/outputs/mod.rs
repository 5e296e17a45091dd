//! Output sinks for an enriched batch.
//!
//! - [`table`]: writes one CSV row per enriched article (the primary output)
//! - [`chart`]: renders the sentiment distribution as a bar chart
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── indian_finance_news_AI_20250506_093012.csv   # one per run
//! └── sentiment_chart_ai.svg                        # overwritten each run
//! ```
//!
//! A table failure is fatal to the run; a chart failure is only reported.

pub mod chart;
pub mod table;

use crate::models::EnrichedArticle;
use crate::pipeline::tally_labels;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, instrument, warn};

/// Failure to write one of the run's output files.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to render chart {path}: {message}")]
    Chart { path: PathBuf, message: String },
    #[error("no sentiment data to chart")]
    EmptyChart,
}

/// Paths of the files produced by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutputs {
    pub table: PathBuf,
    /// `None` when the chart could not be written.
    pub chart: Option<PathBuf>,
}

/// Write the table and then the chart for one enriched batch.
///
/// A table failure is returned as the error. A chart failure is logged as a
/// warning and leaves [`WrittenOutputs::chart`] empty.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub fn write_outputs(
    articles: &[EnrichedArticle],
    output_dir: &Path,
    run_at: &DateTime<Local>,
) -> Result<WrittenOutputs, SinkError> {
    let table = table::write_table(articles, output_dir, run_at).inspect_err(|e| {
        error!(error = %e, "Failed to write CSV table");
    })?;

    let chart = match chart::write_chart(&tally_labels(articles), output_dir) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(error = %e, "Could not save sentiment chart");
            None
        }
    };

    Ok(WrittenOutputs { table, chart })
}
