//! Feed aggregation for Feedmill.
//!
//! This module provides:
//! - Publication date normalization across the date layouts seen in real feeds
//! - RSS fetching and decoding
//! - Idempotent ingestion of feed items as posts
//! - The aggregation loop that walks all feeds in rotation order

pub mod date;
pub mod fetcher;
pub mod ingest;
pub mod interval;
pub mod repository;
pub mod scheduler;
pub mod store;
pub mod types;

pub use date::{normalize, parse_published_at, DateLayout, PublishedAt, LAYOUTS};
pub use fetcher::{parse_feed, validate_url, FeedFetcher, FetchFeed};
pub use ingest::{IngestReport, Ingestor};
pub use interval::parse_interval;
pub use repository::{FeedFollowRepository, FeedRepository, PostRepository};
pub use scheduler::{AggregationSummary, Aggregator, FetchFailurePolicy};
pub use store::{FeedStore, PostStore};
pub use types::{
    Feed, FeedFollow, FeedWithOwner, NewFeed, NewPost, Post, RawFeed, RawItem,
    MAX_FEED_NAME_LENGTH,
};
