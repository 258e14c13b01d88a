//! Ingestion of one feed into the post store.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::date::normalize;
use super::fetcher::FetchFeed;
use super::store::{FeedStore, PostStore};
use super::types::{Feed, NewPost, RawItem};
use crate::error::PostInsertError;
use crate::Result;

/// Per-feed ingestion counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Posts newly stored.
    pub inserted: usize,
    /// Items skipped because their URL was already stored.
    pub duplicates: usize,
    /// Items that could not be stored.
    pub failed: usize,
    /// Items whose publication date fell back to the ingestion time.
    pub fallback_dates: usize,
}

impl IngestReport {
    /// Total number of items seen.
    pub fn items(&self) -> usize {
        self.inserted + self.duplicates + self.failed
    }
}

impl std::ops::AddAssign for IngestReport {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.failed += other.failed;
        self.fallback_dates += other.fallback_dates;
    }
}

/// Fetches feeds and stores their items as posts.
pub struct Ingestor<'a, S, F> {
    store: &'a S,
    fetcher: &'a F,
}

impl<'a, S, F> Ingestor<'a, S, F>
where
    S: FeedStore + PostStore + Sync,
    F: FetchFeed + Sync,
{
    /// Create an ingestor over a store and a fetcher.
    pub fn new(store: &'a S, fetcher: &'a F) -> Self {
        Self { store, fetcher }
    }

    /// The store this ingestor writes to.
    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Fetch `feed` and store every item that is not yet known.
    ///
    /// The feed is marked as checked before the fetch, so a failing feed
    /// still moves to the back of the rotation. A fetch failure aborts the
    /// pass; a failure on one item never stops the others.
    pub async fn ingest_feed(&self, feed: &Feed) -> Result<IngestReport> {
        self.store.mark_feed_checked(feed.id, Utc::now()).await?;

        let raw = self.fetcher.fetch(&feed.url).await?;
        debug!("Feed {} returned {} item(s)", feed.url, raw.items.len());

        let mut report = IngestReport::default();
        for item in raw.items {
            self.store_item(feed, item, &mut report).await;
        }

        info!(
            "Feed {}: {} new, {} duplicate, {} failed",
            feed.name, report.inserted, report.duplicates, report.failed
        );
        Ok(report)
    }

    async fn store_item(&self, feed: &Feed, item: RawItem, report: &mut IngestReport) {
        let published = normalize(&item.pub_date);
        match published.layout() {
            Some(layout) => debug!("pubDate of {} parsed as {}", item.link, layout.name()),
            None => {
                report.fallback_dates += 1;
                warn!(
                    "Unparseable pubDate {:?} for {}, using ingestion time",
                    item.pub_date, item.link
                );
            }
        }

        if item.link.is_empty() {
            report.failed += 1;
            error!("Item {:?} in feed {} has no link", item.title, feed.url);
            return;
        }

        let new_post = NewPost::new(item.link, published.instant(), feed.id)
            .with_title(item.title)
            .with_description(item.description);

        match self.store.insert_post(&new_post).await {
            Ok(_) => report.inserted += 1,
            Err(PostInsertError::DuplicateKey { url }) => {
                report.duplicates += 1;
                debug!("Skipping already stored post {}", url);
            }
            Err(e) => {
                report.failed += 1;
                error!("Failed to store post {}: {}", new_post.url, e);
            }
        }
    }
}
