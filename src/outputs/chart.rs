//! Sentiment distribution chart.
//!
//! Renders one bar per sentiment label that occurs in the batch, as an SVG
//! file with a fixed name that each run overwrites.

use crate::models::SentimentLabel;
use crate::outputs::SinkError;
use plotters::prelude::*;
use plotters::style::full_palette::GREY;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const CHART_FILE_NAME: &str = "sentiment_chart_ai.svg";

const CHART_SIZE: (u32, u32) = (640, 480);

fn bar_color(label: SentimentLabel) -> RGBColor {
    match label {
        SentimentLabel::Positive => GREEN,
        SentimentLabel::Negative => RED,
        SentimentLabel::Neutral => GREY,
    }
}

/// Write the bar chart for `label_counts` into `output_dir`.
///
/// Returns the chart path. An empty map is rejected with
/// [`SinkError::EmptyChart`] rather than rendering blank axes, and a chart left
/// by an earlier run is removed so it cannot be mistaken for this batch's.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub fn write_chart(
    label_counts: &BTreeMap<SentimentLabel, usize>,
    output_dir: &Path,
) -> Result<PathBuf, SinkError> {
    let path = output_dir.join(CHART_FILE_NAME);
    if label_counts.is_empty() {
        remove_stale_chart(&path)?;
        return Err(SinkError::EmptyChart);
    }
    render(label_counts, &path).map_err(|e| SinkError::Chart {
        path: path.clone(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), bars = label_counts.len(), "Wrote sentiment chart");
    Ok(path)
}

fn remove_stale_chart(path: &Path) -> Result<(), SinkError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed chart from previous run");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SinkError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn render(
    label_counts: &BTreeMap<SentimentLabel, usize>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<SentimentLabel> = label_counts.keys().copied().collect();
    let max_count = label_counts.values().copied().max().unwrap_or(0).max(1);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("News Sentiment Distribution", ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0..labels.len()).into_segmented(), 0..max_count + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Sentiment")
        .y_desc("Article Count")
        .x_labels(labels.len())
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels
                .get(*i)
                .map(|label| label.to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .margin(24)
            .style_func(|value, _| match value {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels
                    .get(*i)
                    .map(|label| bar_color(*label))
                    .unwrap_or(BLUE)
                    .filled(),
                SegmentValue::Last => BLUE.filled(),
            })
            .data(label_counts.values().enumerate().map(|(i, count)| (i, *count))),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_chart_renders_present_labels_only() {
        let tmp = tempfile::tempdir().unwrap();
        let counts = BTreeMap::from([(SentimentLabel::Positive, 2), (SentimentLabel::Negative, 1)]);

        let path = write_chart(&counts, tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join(CHART_FILE_NAME));

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("News Sentiment Distribution"));
        assert!(svg.contains("POSITIVE"));
        assert!(svg.contains("NEGATIVE"));
        assert!(!svg.contains("NEUTRAL"));
    }

    #[test]
    fn test_write_chart_overwrites_previous_run() {
        let tmp = tempfile::tempdir().unwrap();
        write_chart(&BTreeMap::from([(SentimentLabel::Neutral, 4)]), tmp.path()).unwrap();
        let path = write_chart(&BTreeMap::from([(SentimentLabel::Positive, 1)]), tmp.path()).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("POSITIVE"));
        assert!(!svg.contains("NEUTRAL"));
    }

    #[test]
    fn test_write_chart_empty_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_chart(&BTreeMap::new(), tmp.path()).unwrap_err();
        assert!(matches!(err, SinkError::EmptyChart));
        assert!(!tmp.path().join(CHART_FILE_NAME).exists());
    }

    #[test]
    fn test_write_chart_empty_counts_removes_previous_chart() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_chart(&BTreeMap::from([(SentimentLabel::Neutral, 3)]), tmp.path()).unwrap();
        assert!(path.exists());

        let err = write_chart(&BTreeMap::new(), tmp.path()).unwrap_err();
        assert!(matches!(err, SinkError::EmptyChart));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_chart_unwritable_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let err = write_chart(&BTreeMap::from([(SentimentLabel::Positive, 1)]), &missing)
            .unwrap_err();
        assert!(matches!(err, SinkError::Chart { .. }));
    }
}
