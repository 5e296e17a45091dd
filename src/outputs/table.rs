//! CSV table output.
//!
//! The table is UTF-8 with a byte-order mark so spreadsheet applications pick
//! the right encoding, and carries a header row:
//!
//! ```text
//! Short_Title,AI_Insight,Entities,Sentiment_Label,Sentiment_Score,Scraped_At
//! ```
//!
//! `Entities` is the entity list joined with `", "`. The file name embeds the
//! run timestamp, so successive runs never overwrite each other.

use crate::models::{EnrichedArticle, SentimentLabel};
use crate::outputs::SinkError;
use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// UTF-8 byte-order mark written ahead of the header row.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One serialized row of the output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "Short_Title")]
    pub short_title: String,
    #[serde(rename = "AI_Insight")]
    pub ai_insight: String,
    #[serde(rename = "Entities")]
    pub entities: String,
    #[serde(rename = "Sentiment_Label")]
    pub sentiment_label: SentimentLabel,
    #[serde(rename = "Sentiment_Score")]
    pub sentiment_score: f64,
    #[serde(rename = "Scraped_At")]
    pub scraped_at: String,
}

impl From<&EnrichedArticle> for TableRow {
    fn from(article: &EnrichedArticle) -> Self {
        Self {
            short_title: article.short_title.clone(),
            ai_insight: article.ai_insight.clone(),
            entities: article.entities.iter().join(", "),
            sentiment_label: article.sentiment_label,
            sentiment_score: article.sentiment_score,
            scraped_at: article.scraped_at.clone(),
        }
    }
}

/// Table file name for a run started at `run_at`.
pub fn table_file_name(run_at: &DateTime<Local>) -> String {
    format!("indian_finance_news_AI_{}.csv", run_at.format("%Y%m%d_%H%M%S"))
}

/// Write `articles` to a timestamped CSV file inside `output_dir`.
///
/// Rows go to a `.partial` sibling that is renamed into place once complete,
/// so a failed run never leaves a truncated table behind. Returns the path of
/// the written file.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), rows = articles.len()))]
pub fn write_table(
    articles: &[EnrichedArticle],
    output_dir: &Path,
    run_at: &DateTime<Local>,
) -> Result<PathBuf, SinkError> {
    let path = output_dir.join(table_file_name(run_at));
    let partial = partial_path(&path);

    let written = write_rows(articles, &partial).and_then(|()| {
        fs::rename(&partial, &path).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })
    });
    if let Err(e) = written {
        match fs::remove_file(&partial) {
            Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => {
                warn!(path = %partial.display(), error = %cleanup, "Could not remove partial table");
            }
            _ => {}
        }
        return Err(e);
    }

    info!(path = %path.display(), "Wrote CSV table");
    Ok(path)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_rows(articles: &[EnrichedArticle], path: &Path) -> Result<(), SinkError> {
    let io_err = |source: std::io::Error| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source: csv::Error| SinkError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(io_err)?;
    file.write_all(UTF8_BOM).map_err(io_err)?;

    let mut writer = csv::Writer::from_writer(file);
    for article in articles {
        writer.serialize(TableRow::from(article)).map_err(csv_err)?;
    }
    // Header is only emitted with the first row.
    if articles.is_empty() {
        writer
            .write_record([
                "Short_Title",
                "AI_Insight",
                "Entities",
                "Sentiment_Label",
                "Sentiment_Score",
                "Scraped_At",
            ])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn run_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 6, 9, 30, 12).unwrap()
    }

    fn sample() -> Vec<EnrichedArticle> {
        vec![
            EnrichedArticle {
                short_title: "RBI Rate Cut Boost Economy Markets".to_string(),
                ai_insight: "RBI cut the repo rate by 25 bps, its first cut in five years."
                    .to_string(),
                entities: vec!["RBI".to_string(), "Rs 500 crore".to_string()],
                sentiment_label: SentimentLabel::Positive,
                sentiment_score: 0.9877,
                scraped_at: "2025-05-06 09:30:14".to_string(),
            },
            EnrichedArticle {
                short_title: "Rupee \"slides\" record low".to_string(),
                ai_insight: "The rupee fell to ₹86.2 against the dollar.\nImporters rushed to hedge."
                    .to_string(),
                entities: vec![],
                sentiment_label: SentimentLabel::Negative,
                sentiment_score: 0.5,
                scraped_at: "2025-05-06 09:30:15".to_string(),
            },
            EnrichedArticle {
                short_title: "Nifty flat".to_string(),
                ai_insight: "Benchmarks ended unchanged.".to_string(),
                entities: vec!["Mumbai".to_string()],
                sentiment_label: SentimentLabel::Neutral,
                sentiment_score: 0.0,
                scraped_at: "2025-05-06 09:30:16".to_string(),
            },
        ]
    }

    fn read_rows(path: &Path) -> (Vec<u8>, Vec<TableRow>, Vec<String>) {
        let bytes = std::fs::read(path).unwrap();
        let mut reader = csv::Reader::from_reader(&bytes[UTF8_BOM.len()..]);
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let rows: Vec<TableRow> = reader
            .deserialize::<TableRow>()
            .map(|r| r.unwrap())
            .collect();
        (bytes, rows, headers)
    }

    #[test]
    fn test_table_file_name() {
        assert_eq!(
            table_file_name(&run_at()),
            "indian_finance_news_AI_20250506_093012.csv"
        );
    }

    #[test]
    fn test_write_table_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let articles = sample();

        let path = write_table(&articles, tmp.path(), &run_at()).unwrap();
        assert_eq!(
            path,
            tmp.path().join("indian_finance_news_AI_20250506_093012.csv")
        );

        let (bytes, rows, headers) = read_rows(&path);
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(
            headers,
            vec![
                "Short_Title",
                "AI_Insight",
                "Entities",
                "Sentiment_Label",
                "Sentiment_Score",
                "Scraped_At"
            ]
        );

        let expected: Vec<TableRow> = articles.iter().map(TableRow::from).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows, expected);
        assert_eq!(rows[0].entities, "RBI, Rs 500 crore");
        assert_eq!(rows[1].entities, "");
    }

    #[test]
    fn test_write_table_scores_have_at_most_four_decimals() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_table(&sample(), tmp.path(), &run_at()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let mut reader = csv::Reader::from_reader(&bytes[UTF8_BOM.len()..]);
        for record in reader.records() {
            let record = record.unwrap();
            let score = &record[4];
            let value: f64 = score.parse().unwrap();
            assert!((0.0..=1.0).contains(&value));
            let decimals = score.split('.').nth(1).map_or(0, str::len);
            assert!(decimals <= 4, "{score} has more than 4 decimals");
        }
    }

    #[test]
    fn test_write_table_empty_batch_has_header_only() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_table(&[], tmp.path(), &run_at()).unwrap();

        let (_, rows, headers) = read_rows(&path);
        assert!(rows.is_empty());
        assert_eq!(headers.len(), 6);
    }

    #[test]
    fn test_write_table_missing_dir_is_sink_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");

        let err = write_table(&sample(), &missing, &run_at()).unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }

    #[test]
    fn test_write_table_leaves_no_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_table(&sample(), tmp.path(), &run_at()).unwrap();

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["indian_finance_news_AI_20250506_093012.csv"]);
    }

    #[test]
    fn test_write_table_failed_finish_removes_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory squatting on the final name makes the rename fail.
        let target = tmp.path().join(table_file_name(&run_at()));
        std::fs::create_dir(&target).unwrap();

        let err = write_table(&sample(), tmp.path(), &run_at()).unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
        assert!(!partial_path(&target).exists());
        assert!(target.is_dir());
    }
}
