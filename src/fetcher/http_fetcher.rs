use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::app::{FeedskyError, Result};
use crate::fetcher::{Fetched, Fetcher};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const USER_AGENT: &str = concat!("feedsky/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(build_client(timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// The HTTP client shared by the feed, preview and posting-service calls.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

impl HttpFetcher {
    async fn get(&self, url: &str, max_bytes: Option<usize>) -> Result<Fetched> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedskyError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let Some(limit) = max_bytes else {
            let body = response.bytes().await?.to_vec();
            return Ok(Fetched { body, content_type });
        };

        let too_large = || FeedskyError::TooLarge {
            url: url.to_string(),
            limit,
        };

        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Fetched { body, content_type })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Fetched> {
        self.get(url, None).await
    }

    async fn fetch_bounded(&self, url: &str, max_bytes: usize) -> Result<Fetched> {
        self.get(url, Some(max_bytes)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<rss/>", "application/rss+xml"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let fetched = fetcher
            .fetch(&format!("{}/feed.xml", server.uri()))
            .await
            .unwrap();

        assert_eq!(fetched.body, b"<rss/>");
        assert_eq!(fetched.content_type.as_deref(), Some("application/rss+xml"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();

        assert!(matches!(err, FeedskyError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_bounded_fetch_within_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![7u8; 16], "image/png"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let fetched = fetcher.fetch_bounded(&server.uri(), 16).await.unwrap();

        assert_eq!(fetched.body.len(), 16);
        assert_eq!(fetched.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_bounded_fetch_rejects_oversized_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 17]))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch_bounded(&server.uri(), 16).await.unwrap_err();

        assert!(matches!(err, FeedskyError::TooLarge { limit: 16, .. }));
    }
}
