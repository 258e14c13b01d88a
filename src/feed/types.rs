//! Feed and post types for Feedmill.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum length of a feed display name.
pub const MAX_FEED_NAME_LENGTH: usize = 200;

/// A subscribed feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Feed ID.
    pub id: Uuid,
    /// When the feed was registered.
    pub created_at: DateTime<Utc>,
    /// When the feed row was last modified.
    pub updated_at: DateTime<Utc>,
    /// Display name.
    pub name: String,
    /// Feed URL (unique).
    pub url: String,
    /// User who registered the feed.
    pub user_id: Uuid,
    /// Last time the feed was checked; `None` if never fetched.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Display name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Owning user.
    pub user_id: Uuid,
}

impl NewFeed {
    /// Create a new feed request.
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// A feed together with the name of the user who registered it.
#[derive(Debug, Clone)]
pub struct FeedWithOwner {
    /// The feed.
    pub feed: Feed,
    /// Owner's user name.
    pub user_name: String,
}

/// A follow relationship, with names resolved for display.
#[derive(Debug, Clone)]
pub struct FeedFollow {
    /// Follow ID.
    pub id: Uuid,
    /// When the follow was created.
    pub created_at: DateTime<Utc>,
    /// Following user.
    pub user_id: Uuid,
    /// Followed feed.
    pub feed_id: Uuid,
    /// Following user's name.
    pub user_name: String,
    /// Followed feed's name.
    pub feed_name: String,
}

/// An ingested post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Post ID.
    pub id: Uuid,
    /// When the post was stored.
    pub created_at: DateTime<Utc>,
    /// When the post row was last modified.
    pub updated_at: DateTime<Utc>,
    /// Title, if the item had one.
    pub title: Option<String>,
    /// Source URL (unique across all posts).
    pub url: String,
    /// Description, if the item had one.
    pub description: Option<String>,
    /// Publication time (normalized, or the ingestion time on fallback).
    pub published_at: DateTime<Utc>,
    /// Feed the post came from.
    pub feed_id: Uuid,
}

/// New post for insertion.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Title.
    pub title: Option<String>,
    /// Source URL.
    pub url: String,
    /// Description.
    pub description: Option<String>,
    /// Publication time.
    pub published_at: DateTime<Utc>,
    /// Owning feed.
    pub feed_id: Uuid,
}

impl NewPost {
    /// Create a new post request with no title or description.
    pub fn new(url: impl Into<String>, published_at: DateTime<Utc>, feed_id: Uuid) -> Self {
        Self {
            title: None,
            url: url.into(),
            description: None,
            published_at,
            feed_id,
        }
    }

    /// Set the title. Empty strings are stored as NULL.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_empty(title.into());
        self
    }

    /// Set the description. Empty strings are stored as NULL.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_empty(description.into());
        self
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// A decoded RSS document.
///
/// Lives only for one fetch-and-ingest pass. Absent elements are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeed {
    /// `channel/title`.
    pub title: String,
    /// `channel/link`.
    pub link: String,
    /// `channel/description`.
    pub description: String,
    /// `channel/item`, in document order.
    pub items: Vec<RawItem>,
}

/// One `channel/item` of a decoded RSS document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    /// `title`.
    pub title: String,
    /// `link`.
    pub link: String,
    /// `description`.
    pub description: String,
    /// `pubDate`, exactly as it appeared in the document.
    pub pub_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_empty_fields_are_none() {
        let post = NewPost::new("https://example.com/1", Utc::now(), Uuid::new_v4())
            .with_title("")
            .with_description("");
        assert!(post.title.is_none());
        assert!(post.description.is_none());
    }

    #[test]
    fn test_new_post_with_fields() {
        let post = NewPost::new("https://example.com/1", Utc::now(), Uuid::new_v4())
            .with_title("Hello")
            .with_description("World");
        assert_eq!(post.title.as_deref(), Some("Hello"));
        assert_eq!(post.description.as_deref(), Some("World"));
    }
}
