//! News source scrapers.
//!
//! A source performs one fetch-and-parse pass over a single listing page and
//! yields the raw `(title, summary)` pairs found there. There is no
//! pagination and no incremental state between runs.
//!
//! # Supported Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | Moneycontrol markets | [`moneycontrol`] | HTML scraping of `li.clearfix` items |

pub mod moneycontrol;

use crate::models::RawArticle;
use std::error::Error;

/// A listing page that can be turned into raw articles.
pub trait SourceProvider {
    /// Fetch the listing once and return its articles in page order.
    ///
    /// Items lacking a title or summary are still returned, with the missing
    /// field left empty, so the pipeline can account for them.
    async fn fetch_articles(&self) -> Result<Vec<RawArticle>, Box<dyn Error>>;
}
