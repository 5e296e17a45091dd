//! Data models for scraped and enriched finance news articles.
//!
//! This module defines the records that flow through the application:
//! - [`RawArticle`]: an unprocessed `(title, summary)` pair from the listing page
//! - [`EnrichedArticle`]: an article after summarization, sentiment scoring and
//!   entity extraction, ready to be written as one table row
//! - [`SentimentLabel`], [`Sentiment`], [`EntityCategory`], [`Entity`]: the
//!   structured results returned by the enrichment services

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A raw news article as scraped from the listing page.
///
/// Either field may be empty when the listing item lacked the matching tag.
/// The text is untrusted and of arbitrary length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArticle {
    /// The headline text.
    pub title: String,
    /// The teaser paragraph shown under the headline.
    pub summary: String,
}

impl RawArticle {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
        }
    }
}

/// Sentiment class reported by the classifier.
///
/// Serialized in upper case (`POSITIVE`, `NEGATIVE`, `NEUTRAL`), which is both
/// the wire format of the classifier reply and the value written to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    #[serde(alias = "positive", alias = "Positive")]
    Positive,
    #[serde(alias = "negative", alias = "Negative")]
    Negative,
    #[serde(alias = "neutral", alias = "Neutral")]
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sentiment classification: label plus confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: f64,
}

/// Named-entity category as tagged by the entity recognizer.
///
/// Tags follow the usual NER label set (`ORG`, `GPE`, `MONEY`, `PERSON`, ...)
/// and are matched case-insensitively, so `Person` and `person` both map to
/// [`EntityCategory::Person`]. Anything outside the recognized set becomes
/// [`EntityCategory::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityCategory {
    #[serde(rename = "ORG")]
    Organization,
    #[serde(rename = "GPE")]
    Location,
    #[serde(rename = "MONEY")]
    Money,
    #[serde(rename = "PERSON")]
    Person,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "PERCENT")]
    Percent,
    #[serde(rename = "OTHER")]
    Other,
}

impl From<&str> for EntityCategory {
    fn from(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "ORG" | "ORGANIZATION" | "ORGANISATION" => EntityCategory::Organization,
            "GPE" | "LOC" | "LOCATION" => EntityCategory::Location,
            "MONEY" => EntityCategory::Money,
            "PERSON" | "PER" => EntityCategory::Person,
            "DATE" => EntityCategory::Date,
            "PERCENT" => EntityCategory::Percent,
            _ => EntityCategory::Other,
        }
    }
}

impl<'de> Deserialize<'de> for EntityCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(EntityCategory::from(tag.as_str()))
    }
}

impl EntityCategory {
    /// Whether entities of this category are kept in the enriched record.
    ///
    /// Only organizations, locations, monetary amounts and people are retained.
    pub fn is_allowed(&self) -> bool {
        matches!(
            self,
            EntityCategory::Organization
                | EntityCategory::Location
                | EntityCategory::Money
                | EntityCategory::Person
        )
    }
}

/// A single entity mention extracted from article text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entity {
    pub text: String,
    pub category: EntityCategory,
}

/// A fully enriched article, one row of the output table.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedArticle {
    /// Headline with stop words removed, capped at the configured word count.
    pub short_title: String,
    /// Model-generated summary of the teaser paragraph.
    pub ai_insight: String,
    /// Allow-listed entities in order of appearance (duplicates kept).
    pub entities: Vec<String>,
    pub sentiment_label: SentimentLabel,
    /// Classifier confidence, rounded to 4 decimal places.
    pub sentiment_score: f64,
    /// Local capture time, `%Y-%m-%d %H:%M:%S`.
    pub scraped_at: String,
}
