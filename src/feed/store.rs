//! Store capabilities used by ingestion and scheduling.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::repository::{FeedRepository, PostRepository};
use super::types::{Feed, NewPost, Post};
use crate::db::Database;
use crate::error::PostInsertError;
use crate::Result;

/// Feed persistence needed by the aggregator.
pub trait FeedStore {
    /// All feeds in rotation order (never-fetched first, then oldest check).
    fn list_feeds(&self) -> impl Future<Output = Result<Vec<Feed>>> + Send;

    /// Record that `feed_id` was checked at `at`.
    fn mark_feed_checked(
        &self,
        feed_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Look up a feed by URL.
    fn get_feed_by_url(&self, url: &str) -> impl Future<Output = Result<Option<Feed>>> + Send;
}

/// Post persistence needed by ingestion.
pub trait PostStore {
    /// Insert a post, reporting duplicates distinctly.
    fn insert_post(
        &self,
        post: &NewPost,
    ) -> impl Future<Output = std::result::Result<Post, PostInsertError>> + Send;
}

impl FeedStore for Database {
    async fn list_feeds(&self) -> Result<Vec<Feed>> {
        FeedRepository::new(self.pool()).list().await
    }

    async fn mark_feed_checked(&self, feed_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        FeedRepository::new(self.pool()).mark_checked(feed_id, at).await
    }

    async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        FeedRepository::new(self.pool()).get_by_url(url).await
    }
}

impl PostStore for Database {
    async fn insert_post(&self, post: &NewPost) -> std::result::Result<Post, PostInsertError> {
        PostRepository::new(self.pool()).insert(post).await
    }
}
