use feed_rs::parser;
use html_escape::decode_html_entities;
use scraper::Html;

use crate::app::{FeedskyError, Result};
use crate::domain::FeedItem;

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Decode raw feed bytes into items, in document order.
    pub fn normalize(&self, body: &[u8]) -> Result<Vec<FeedItem>> {
        let feed = parser::parse(body).map_err(|e| FeedskyError::FeedParse(e.to_string()))?;

        let items = feed
            .entries
            .into_iter()
            .map(|entry| {
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default();

                FeedItem {
                    guid: entry.id,
                    title: entry
                        .title
                        .map(|t| decode_html_entities(&t.content).trim().to_string())
                        .unwrap_or_default(),
                    link,
                    description: entry
                        .summary
                        .map(|s| plain_text(&s.content))
                        .filter(|s| !s.is_empty()),
                    published_at: entry.published.or(entry.updated),
                    categories: entry
                        .categories
                        .into_iter()
                        .map(|c| c.term)
                        .collect(),
                }
            })
            .collect();

        Ok(items)
    }
}

/// Strip markup from an HTML fragment and collapse whitespace.
fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
