//! Open Graph metadata for link-preview cards.
//!
//! Previews are best-effort: callers treat any error from
//! [`PreviewFetcher::fetch_preview`] as "no preview available".

use std::sync::Arc;

use scraper::{Html, Selector};
use url::Url;

use crate::app::Result;
use crate::fetcher::Fetcher;

/// Open Graph properties of a page. Each is absent when the page doesn't
/// declare it with non-empty content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl MetaInfo {
    /// Extract `og:title`, `og:description` and `og:image` from a page.
    ///
    /// A relative image URL is resolved against `page_url`.
    pub fn from_html(html: &str, page_url: &str) -> Self {
        let document = Html::parse_document(html);

        let thumbnail_url = find_meta_property(&document, "og:image")
            .and_then(|src| resolve_url(page_url, &src));

        Self {
            title: find_meta_property(&document, "og:title"),
            description: find_meta_property(&document, "og:description"),
            thumbnail_url,
        }
    }
}

/// Content of the first `<meta property="{name}">` with non-empty content.
pub fn find_meta_property(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse("meta[property]").ok()?;

    document
        .select(&selector)
        .filter(|meta| meta.value().attr("property") == Some(name))
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(String::from)
}

fn resolve_url(base: &str, candidate: &str) -> Option<String> {
    match Url::parse(candidate) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)
            .and_then(|b| b.join(candidate))
            .map(|u| u.to_string())
            .ok(),
        Err(_) => None,
    }
}

/// Pages larger than this are not scanned for metadata.
pub const MAX_PAGE_BYTES: usize = 2_000_000;

pub struct PreviewFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl PreviewFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self { fetcher }
    }

    pub async fn fetch_preview(&self, url: &str) -> Result<MetaInfo> {
        let page = self.fetcher.fetch_bounded(url, MAX_PAGE_BYTES).await?;
        let html = String::from_utf8_lossy(&page.body);
        Ok(MetaInfo::from_html(&html, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FeedskyError;
    use crate::fetcher::http_fetcher::HttpFetcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<!doctype html>
<html><head>
  <meta property="og:title" content="">
  <meta property="og:title" content="Real Title">
  <meta property="og:title" content="Second Title">
  <meta name="description" content="not open graph">
  <meta property="og:image" content="/img/card.png">
</head><body></body></html>"#;

    #[test]
    fn test_first_non_empty_match_wins() {
        let meta = MetaInfo::from_html(PAGE, "https://example.com/post/1");
        assert_eq!(meta.title.as_deref(), Some("Real Title"));
    }

    #[test]
    fn test_missing_property_is_absent() {
        let meta = MetaInfo::from_html(PAGE, "https://example.com/post/1");
        assert_eq!(meta.description, None);
    }

    #[test]
    fn test_relative_image_is_resolved() {
        let meta = MetaInfo::from_html(PAGE, "https://example.com/post/1");
        assert_eq!(
            meta.thumbnail_url.as_deref(),
            Some("https://example.com/img/card.png")
        );
    }

    #[test]
    fn test_absolute_image_is_kept() {
        let html = r#"<meta property="og:image" content="https://cdn.example.com/a.jpg">"#;
        let meta = MetaInfo::from_html(html, "https://example.com/");
        assert_eq!(
            meta.thumbnail_url.as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
    }

    #[test]
    fn test_page_without_metadata() {
        let meta = MetaInfo::from_html("<html><body>hi</body></html>", "https://example.com/");
        assert_eq!(meta, MetaInfo::default());
    }

    #[tokio::test]
    async fn test_fetch_preview() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<meta property="og:title" content="T"><meta property="og:description" content="D">"#,
            ))
            .mount(&server)
            .await;

        let previews = PreviewFetcher::new(Arc::new(HttpFetcher::new().unwrap()));
        let meta = previews
            .fetch_preview(&format!("{}/article", server.uri()))
            .await
            .unwrap();

        assert_eq!(meta.title.as_deref(), Some("T"));
        assert_eq!(meta.description.as_deref(), Some("D"));
        assert_eq!(meta.thumbnail_url, None);
    }

    #[tokio::test]
    async fn test_fetch_preview_propagates_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let previews = PreviewFetcher::new(Arc::new(HttpFetcher::new().unwrap()));
        let err = previews.fetch_preview(&server.uri()).await.unwrap_err();

        assert!(matches!(err, FeedskyError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_oversized_page_is_not_scanned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b' '; MAX_PAGE_BYTES + 1]))
            .mount(&server)
            .await;

        let previews = PreviewFetcher::new(Arc::new(HttpFetcher::new().unwrap()));
        let err = previews.fetch_preview(&server.uri()).await.unwrap_err();

        assert!(matches!(err, FeedskyError::TooLarge { .. }));
    }
}
