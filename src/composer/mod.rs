//! Turns feed items into post records.
//!
//! Facet offsets are UTF-8 byte offsets into the final text, which is what
//! the posting service's rich-text contract expects.

use std::sync::Arc;

use crate::app::{FeedskyError, Result};
use crate::bluesky::BlueskyClient;
use crate::domain::post::POST_COLLECTION;
use crate::domain::{
    BlobRef, ByteSlice, Embed, ExternalCard, Facet, FacetFeature, FeedItem, PostRecord, Session,
};
use crate::fetcher::Fetcher;
use crate::preview::MetaInfo;

/// Largest image the posting service accepts as a blob.
pub const MAX_THUMBNAIL_BYTES: usize = 1_000_000;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Append-only text buffer that records facets as spans are added.
#[derive(Debug, Default)]
struct RichText {
    text: String,
    facets: Vec<Facet>,
}

impl RichText {
    fn push(&mut self, span: &str) -> ByteSlice {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        let byte_start = self.text.len();
        self.text.push_str(span);
        ByteSlice {
            byte_start,
            byte_end: self.text.len(),
        }
    }

    fn push_text(&mut self, span: &str) {
        if !span.is_empty() {
            self.push(span);
        }
    }

    fn push_facet(&mut self, span: &str, feature: FacetFeature) {
        if span.is_empty() {
            return;
        }
        let index = self.push(span);
        self.facets.push(Facet {
            index,
            features: vec![feature],
        });
    }
}

/// Hashtag form of a feed category: no leading `#`, no whitespace.
fn hashtag(category: &str) -> String {
    category
        .trim_start_matches('#')
        .split_whitespace()
        .collect()
}

/// Build the post text: title, the GUID as a link, then one hashtag per
/// category, single-space separated.
pub fn compose_text(item: &FeedItem) -> (String, Vec<Facet>) {
    let mut rich = RichText::default();

    rich.push_text(&item.title);
    rich.push_facet(
        &item.guid,
        FacetFeature::Link {
            uri: item.guid.clone(),
        },
    );

    for tag in item.categories.iter().map(|c| hashtag(c)) {
        if tag.is_empty() {
            continue;
        }
        rich.push_facet(&format!("#{}", tag), FacetFeature::Tag { tag });
    }

    (rich.text, rich.facets)
}

/// Link card for the item, with page metadata merged over item data.
///
/// Returns `None` when the item has no link to point the card at.
pub fn build_embed(
    item: &FeedItem,
    preview: Option<&MetaInfo>,
    thumb: Option<BlobRef>,
) -> Option<Embed> {
    if item.link.is_empty() {
        return None;
    }

    let title = preview
        .and_then(|p| p.title.clone())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| item.title.clone());

    let description = preview
        .and_then(|p| p.description.clone())
        .filter(|d| !d.is_empty())
        .or_else(|| item.description.clone())
        .unwrap_or_default();

    Some(Embed::external(ExternalCard {
        uri: item.link.clone(),
        title,
        description,
        thumb,
    }))
}

pub struct Composer {
    client: BlueskyClient,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    language: String,
}

impl Composer {
    pub fn new(
        client: BlueskyClient,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            client,
            fetcher,
            language: language.into(),
        }
    }

    /// Compose the full record for `item`.
    ///
    /// Fails only on a missing or malformed publish date; a thumbnail that
    /// can't be uploaded just leaves the card without one.
    pub async fn compose(
        &self,
        session: &Session,
        item: &FeedItem,
        preview: Option<&MetaInfo>,
    ) -> Result<PostRecord> {
        let created_at = item.created_at()?;
        let (text, facets) = compose_text(item);

        let thumb = match preview.and_then(|p| p.thumbnail_url.as_deref()) {
            Some(image_url) => match self.upload_blob(session, image_url).await {
                Ok(blob) => Some(blob),
                Err(e) => {
                    tracing::warn!(guid = %item.guid, "Posting without thumbnail: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(PostRecord {
            kind: POST_COLLECTION.to_string(),
            text,
            created_at,
            langs: vec![self.language.clone()],
            facets,
            embed: build_embed(item, preview, thumb),
        })
    }

    /// Fetch the image at `image_url` and store it as a blob.
    pub async fn upload_blob(&self, session: &Session, image_url: &str) -> Result<BlobRef> {
        let image = self
            .fetcher
            .fetch_bounded(image_url, MAX_THUMBNAIL_BYTES)
            .await
            .map_err(|e| FeedskyError::Upload(format!("fetching {}: {}", image_url, e)))?;

        let content_type = image
            .content_type
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        self.client
            .upload_blob(session, &content_type, image.body)
            .await
    }
}
