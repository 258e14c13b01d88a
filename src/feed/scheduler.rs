//! Aggregation scheduler.
//!
//! Walks every feed in rotation order, one at a time, waiting the
//! configured interval between consecutive feeds.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use super::fetcher::FetchFeed;
use super::ingest::{IngestReport, Ingestor};
use super::store::{FeedStore, PostStore};
use crate::Result;

/// What the aggregator does when a feed cannot be ingested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailurePolicy {
    /// Stop the run and return the error.
    #[default]
    Halt,
    /// Log the error and continue with the next feed.
    Skip,
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    /// Feeds ingested successfully.
    pub feeds_processed: usize,
    /// Feeds skipped after an error.
    pub feeds_failed: usize,
    /// Item counts summed over all processed feeds.
    pub totals: IngestReport,
}

/// Runs ingestion over all feeds.
pub struct Aggregator<'a, S, F> {
    ingestor: Ingestor<'a, S, F>,
    interval: Duration,
    policy: FetchFailurePolicy,
}

impl<'a, S, F> Aggregator<'a, S, F>
where
    S: FeedStore + PostStore + Sync,
    F: FetchFeed + Sync,
{
    /// Create an aggregator waiting `interval` between feeds.
    pub fn new(ingestor: Ingestor<'a, S, F>, interval: Duration, policy: FetchFailurePolicy) -> Self {
        Self {
            ingestor,
            interval,
            policy,
        }
    }

    /// Process every feed once.
    ///
    /// With [`FetchFailurePolicy::Halt`] the first failing feed ends the run
    /// and its error is returned; feeds after it are left untouched.
    pub async fn run(&self) -> Result<AggregationSummary> {
        let feeds = self.ingestor.store().list_feeds().await?;
        info!(
            "Collecting {} feed(s) every {:?}",
            feeds.len(),
            self.interval
        );

        let mut ticker = if self.interval.is_zero() {
            None
        } else {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            Some(ticker)
        };

        let mut summary = AggregationSummary::default();
        for (i, feed) in feeds.iter().enumerate() {
            if i > 0 {
                if let Some(ticker) = ticker.as_mut() {
                    ticker.tick().await;
                }
            }

            match self.ingestor.ingest_feed(feed).await {
                Ok(report) => {
                    summary.feeds_processed += 1;
                    summary.totals += report;
                }
                Err(e) => match self.policy {
                    FetchFailurePolicy::Halt => {
                        error!("Failed to ingest feed {}: {}", feed.url, e);
                        return Err(e);
                    }
                    FetchFailurePolicy::Skip => {
                        warn!("Skipping feed {}: {}", feed.url, e);
                        summary.feeds_failed += 1;
                    }
                },
            }
        }

        info!(
            "Aggregation finished: {} feed(s) processed, {} failed, {} new post(s)",
            summary.feeds_processed, summary.feeds_failed, summary.totals.inserted
        );
        Ok(summary)
    }
}
