//! Moneycontrol markets listing scraper.
//!
//! The listing at `https://www.moneycontrol.com/news/business/markets/` renders
//! each story as an `li.clearfix` element with the headline in an `h2` and a
//! one-paragraph teaser in a `p`. The site rejects requests without a browser
//! user agent, so one is always sent.

use crate::models::RawArticle;
use crate::scrapers::SourceProvider;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument};
use url::Url;

/// Scraper for a Moneycontrol-style news listing page.
#[derive(Debug, Clone)]
pub struct Moneycontrol {
    url: Url,
    client: Client,
}

impl Moneycontrol {
    pub fn new(url: &str, user_agent: &str) -> Result<Self, Box<dyn Error>> {
        let url = Url::parse(url)?;
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { url, client })
    }
}

impl SourceProvider for Moneycontrol {
    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn fetch_articles(&self) -> Result<Vec<RawArticle>, Box<dyn Error>> {
        let html = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(bytes = html.len(), "Fetched listing page");

        let articles = parse_listing(&html)?;
        info!(count = articles.len(), "Found articles on listing page");
        Ok(articles)
    }
}

/// Extract raw articles from listing HTML, in document order.
pub fn parse_listing(html: &str) -> Result<Vec<RawArticle>, Box<dyn Error>> {
    let document = Html::parse_document(html);
    let item_selector = Selector::parse("li.clearfix")?;
    let title_selector = Selector::parse("h2")?;
    let summary_selector = Selector::parse("p")?;

    let articles = document
        .select(&item_selector)
        .map(|item| {
            RawArticle::new(
                first_text(item, &title_selector),
                first_text(item, &summary_selector),
            )
        })
        .collect();
    Ok(articles)
}

/// Whitespace-normalized text of the first descendant matching `selector`,
/// or `""` when there is none.
fn first_text(item: ElementRef<'_>, selector: &Selector) -> String {
    item.select(selector)
        .next()
        .map(|el| el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}
