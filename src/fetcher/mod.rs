pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: Vec<u8>,
    /// Value of the `Content-Type` response header, if any
    pub content_type: Option<String>,
}

#[async_trait]
pub trait Fetcher {
    /// GET `url`, failing on transport errors and non-success statuses.
    async fn fetch(&self, url: &str) -> Result<Fetched>;

    /// Like [`fetch`](Fetcher::fetch), but gives up with
    /// [`FeedskyError::TooLarge`](crate::app::FeedskyError::TooLarge) as soon
    /// as the body is known to exceed `max_bytes`.
    async fn fetch_bounded(&self, url: &str, max_bytes: usize) -> Result<Fetched>;
}
