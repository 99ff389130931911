//! The publish loop: the deduplication gate between the feed and the
//! posting service.
//!
//! A GUID is written to the ledger only after its post was accepted, so a
//! GUID is sent at most once across runs unless `ignore_existing` is set.
//! The first failed send aborts the run; items before it stay recorded.

use std::sync::Arc;

use crate::app::Result;
use crate::bluesky::{BlueskyClient, SessionManager};
use crate::composer::{compose_text, Composer};
use crate::domain::FeedItem;
use crate::preview::{MetaInfo, PreviewFetcher};
use crate::store::Ledger;

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Log would-be posts without contacting the service or writing the ledger
    pub dry_run: bool,
    /// Process items even if the ledger already has their GUID
    pub ignore_existing: bool,
    /// Maximum number of items to process; `None` is unbounded
    pub limit: Option<usize>,
}

impl PublishOptions {
    /// Map the CLI's count convention (negative means unbounded) to a limit.
    pub fn limit_from_count(count: i64) -> Option<usize> {
        usize::try_from(count).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub posted: usize,
    pub skipped: usize,
    /// Items logged instead of posted in dry-run mode
    pub previewed: usize,
}

impl PublishReport {
    /// Items counted against the limit.
    pub fn processed(&self) -> usize {
        self.posted + self.previewed
    }
}

pub struct Publisher {
    ledger: Arc<dyn Ledger + Send + Sync>,
    sessions: SessionManager,
    previews: PreviewFetcher,
    composer: Composer,
    client: BlueskyClient,
}

impl Publisher {
    pub fn new(
        ledger: Arc<dyn Ledger + Send + Sync>,
        sessions: SessionManager,
        previews: PreviewFetcher,
        composer: Composer,
        client: BlueskyClient,
    ) -> Self {
        Self {
            ledger,
            sessions,
            previews,
            composer,
            client,
        }
    }

    /// Walk `items` in feed order, posting every one not yet in the ledger.
    pub async fn publish(
        &mut self,
        items: &[FeedItem],
        options: &PublishOptions,
    ) -> Result<PublishReport> {
        let mut report = PublishReport::default();

        for item in items {
            if let Some(limit) = options.limit {
                if report.processed() >= limit {
                    tracing::info!(limit, "Reached item limit");
                    break;
                }
            }

            if !options.ignore_existing && self.ledger.is_posted(&item.guid)? {
                tracing::info!(guid = %item.guid, "Already posted, skipping");
                report.skipped += 1;
                continue;
            }

            if options.dry_run {
                let (text, facets) = compose_text(item);
                tracing::info!(guid = %item.guid, facets = facets.len(), "Dry run, would post: {}", text);
                report.previewed += 1;
                continue;
            }

            self.publish_item(item).await?;
            report.posted += 1;
        }

        Ok(report)
    }

    async fn publish_item(&mut self, item: &FeedItem) -> Result<()> {
        let session = self.sessions.ensure_session().await?;
        let preview = self.fetch_preview(item).await;

        let record = self
            .composer
            .compose(&session, item, preview.as_ref())
            .await?;

        let confirmation = self.client.create_record(&session, &record).await?;
        tracing::debug!(guid = %item.guid, %confirmation, "Record created");

        self.ledger.mark_posted(&item.guid)?;
        tracing::info!(guid = %item.guid, "Posted {}", item.display_title());

        Ok(())
    }

    async fn fetch_preview(&self, item: &FeedItem) -> Option<MetaInfo> {
        if item.link.is_empty() {
            return None;
        }

        match self.previews.fetch_preview(&item.link).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(link = %item.link, "No link preview: {}", e);
                None
            }
        }
    }
}
