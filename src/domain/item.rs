use chrono::{DateTime, SecondsFormat, Utc};

use crate::app::{FeedskyError, Result};

/// A single entry of the source feed, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
}

impl FeedItem {
    pub fn new(guid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            title: title.into(),
            link: String::new(),
            description: None,
            published_at: None,
            categories: Vec::new(),
        }
    }

    /// Publish date as an extended ISO-8601 timestamp, as the posting service
    /// expects it in `createdAt`.
    pub fn created_at(&self) -> Result<String> {
        self.published_at
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .ok_or_else(|| {
                FeedskyError::Format(format!(
                    "item {} has a missing or malformed publish date",
                    self.guid
                ))
            })
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_created_at_is_rfc3339() {
        let mut item = FeedItem::new("g1", "Title");
        item.published_at = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(item.created_at().unwrap(), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_created_at_without_date_is_format_error() {
        let item = FeedItem::new("g1", "Title");
        assert!(matches!(item.created_at(), Err(FeedskyError::Format(_))));
    }

    #[test]
    fn test_display_title_without_title() {
        let item = FeedItem::new("g1", "");
        assert_eq!(item.display_title(), "(Untitled)");
    }
}
