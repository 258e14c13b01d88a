//! Feedmill - a scheduled RSS aggregator.
//!
//! Users register feeds, a single-threaded aggregation loop fetches them
//! one at a time in rotation order, and every feed item is stored exactly
//! once as a post keyed by its URL.

pub mod commands;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod session;

pub use config::Config;
pub use db::{Database, DbPool, NewUser, User, UserRepository};
pub use error::{FeedmillError, FetchError, PostInsertError, Result};
pub use feed::{
    normalize, parse_interval, AggregationSummary, Aggregator, Feed, FeedFetcher, FeedStore,
    FetchFailurePolicy, FetchFeed, IngestReport, Ingestor, NewFeed, NewPost, Post, PostStore,
    PublishedAt, RawFeed, RawItem,
};
pub use session::{Session, SessionFile};
