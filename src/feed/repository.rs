//! Feed, follow and post repositories for Feedmill.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{
    Feed, FeedFollow, FeedWithOwner, NewFeed, NewPost, Post, MAX_FEED_NAME_LENGTH,
};
use crate::datetime::{parse_db_timestamp, to_db_timestamp};
use crate::db::{parse_id, DbPool};
use crate::error::PostInsertError;
use crate::{FeedmillError, Result};

/// Row type for feeds from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedRow {
    id: String,
    created_at: String,
    updated_at: String,
    name: String,
    url: String,
    user_id: String,
    last_fetched_at: Option<String>,
}

impl TryFrom<FeedRow> for Feed {
    type Error = FeedmillError;

    fn try_from(row: FeedRow) -> Result<Self> {
        Ok(Feed {
            id: parse_id(&row.id)?,
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
            name: row.name,
            url: row.url,
            user_id: parse_id(&row.user_id)?,
            last_fetched_at: row.last_fetched_at.and_then(|s| parse_db_timestamp(&s)),
        })
    }
}

/// Row type for feeds joined with their owner.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedWithOwnerRow {
    id: String,
    created_at: String,
    updated_at: String,
    name: String,
    url: String,
    user_id: String,
    last_fetched_at: Option<String>,
    user_name: String,
}

impl TryFrom<FeedWithOwnerRow> for FeedWithOwner {
    type Error = FeedmillError;

    fn try_from(row: FeedWithOwnerRow) -> Result<Self> {
        let feed = Feed::try_from(FeedRow {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            name: row.name,
            url: row.url,
            user_id: row.user_id,
            last_fetched_at: row.last_fetched_at,
        })?;
        Ok(FeedWithOwner {
            feed,
            user_name: row.user_name,
        })
    }
}

/// Row type for follows with resolved names.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedFollowRow {
    id: String,
    created_at: String,
    user_id: String,
    feed_id: String,
    user_name: String,
    feed_name: String,
}

impl TryFrom<FeedFollowRow> for FeedFollow {
    type Error = FeedmillError;

    fn try_from(row: FeedFollowRow) -> Result<Self> {
        Ok(FeedFollow {
            id: parse_id(&row.id)?,
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            user_id: parse_id(&row.user_id)?,
            feed_id: parse_id(&row.feed_id)?,
            user_name: row.user_name,
            feed_name: row.feed_name,
        })
    }
}

/// Row type for posts from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PostRow {
    id: String,
    created_at: String,
    updated_at: String,
    title: Option<String>,
    url: String,
    description: Option<String>,
    published_at: String,
    feed_id: String,
}

impl TryFrom<PostRow> for Post {
    type Error = FeedmillError;

    fn try_from(row: PostRow) -> Result<Self> {
        Ok(Post {
            id: parse_id(&row.id)?,
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
            title: row.title,
            url: row.url,
            description: row.description,
            published_at: parse_db_timestamp(&row.published_at).unwrap_or_else(Utc::now),
            feed_id: parse_id(&row.feed_id)?,
        })
    }
}

const FEED_COLUMNS: &str = "id, created_at, updated_at, name, url, user_id, last_fetched_at";

const INSERT_FEED: &str = r#"
    INSERT INTO feeds (id, created_at, updated_at, name, url, user_id)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

const INSERT_FOLLOW: &str = r#"
    INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_id)
    VALUES ($1, $2, $3, $4, $5)
"#;

/// Validate a new feed and assign its identity.
fn build_feed(new_feed: &NewFeed) -> Result<Feed> {
    let name = new_feed.name.trim();
    if name.is_empty() {
        return Err(FeedmillError::Validation("feed name is empty".into()));
    }
    if name.chars().count() > MAX_FEED_NAME_LENGTH {
        return Err(FeedmillError::Validation(format!(
            "feed name exceeds {} characters",
            MAX_FEED_NAME_LENGTH
        )));
    }
    if new_feed.url.trim().is_empty() {
        return Err(FeedmillError::Validation("feed URL is empty".into()));
    }

    let now = Utc::now();
    Ok(Feed {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        name: name.to_string(),
        url: new_feed.url.trim().to_string(),
        user_id: new_feed.user_id,
        last_fetched_at: None,
    })
}

fn feed_insert_error(e: sqlx::Error, url: &str) -> FeedmillError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            FeedmillError::Validation(format!("feed {url} already exists"))
        }
        _ => FeedmillError::Database(e.to_string()),
    }
}

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Register a new feed.
    ///
    /// Returns a validation error if the name is empty or too long, or if
    /// another feed already uses the URL.
    pub async fn create(&self, new_feed: &NewFeed) -> Result<Feed> {
        let feed = build_feed(new_feed)?;

        sqlx::query(INSERT_FEED)
            .bind(feed.id.to_string())
            .bind(to_db_timestamp(&feed.created_at))
            .bind(to_db_timestamp(&feed.updated_at))
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(feed.user_id.to_string())
            .execute(self.pool)
            .await
            .map_err(|e| feed_insert_error(e, &feed.url))?;

        Ok(feed)
    }

    /// Create a feed and make its owner follow it, in one transaction.
    ///
    /// Either both rows are written or neither is.
    pub async fn create_followed(&self, new_feed: &NewFeed) -> Result<Feed> {
        let feed = build_feed(new_feed)?;
        let now = to_db_timestamp(&feed.created_at);

        let mut tx = self.pool.begin().await?;

        sqlx::query(INSERT_FEED)
            .bind(feed.id.to_string())
            .bind(&now)
            .bind(&now)
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(feed.user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| feed_insert_error(e, &feed.url))?;

        sqlx::query(INSERT_FOLLOW)
            .bind(Uuid::new_v4().to_string())
            .bind(&now)
            .bind(&now)
            .bind(feed.user_id.to_string())
            .bind(feed.id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(feed)
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        row.map(Feed::try_from).transpose()
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE url = $1"
        ))
        .bind(url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        row.map(Feed::try_from).transpose()
    }

    /// List all feeds in rotation order.
    ///
    /// Never-fetched feeds come first, then the least recently checked.
    pub async fn list(&self) -> Result<Vec<Feed>> {
        let rows = sqlx::query_as::<_, FeedRow>(&format!(
            r#"
            SELECT {FEED_COLUMNS} FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST, created_at ASC, url ASC
            "#
        ))
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        rows.into_iter().map(Feed::try_from).collect()
    }

    /// List all feeds with the name of the user who registered each one.
    pub async fn list_with_owners(&self) -> Result<Vec<FeedWithOwner>> {
        let rows = sqlx::query_as::<_, FeedWithOwnerRow>(
            r#"
            SELECT f.id, f.created_at, f.updated_at, f.name, f.url, f.user_id,
                   f.last_fetched_at, u.name AS user_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.created_at ASC, f.url ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        rows.into_iter().map(FeedWithOwner::try_from).collect()
    }

    /// Record that a feed was checked at `at`.
    pub async fn mark_checked(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let at = to_db_timestamp(&at);
        let result = sqlx::query(
            "UPDATE feeds SET last_fetched_at = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(&at)
        .bind(&at)
        .bind(id.to_string())
        .execute(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(FeedmillError::NotFound(format!("feed {}", id)));
        }
        Ok(())
    }
}

/// Repository for follow operations.
pub struct FeedFollowRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedFollowRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Make `user_id` follow `feed_id`.
    ///
    /// Returns a validation error if the follow already exists.
    pub async fn create(&self, user_id: Uuid, feed_id: Uuid) -> Result<FeedFollow> {
        let id = Uuid::new_v4();
        let now = to_db_timestamp(&Utc::now());

        sqlx::query(INSERT_FOLLOW)
            .bind(id.to_string())
            .bind(&now)
            .bind(&now)
            .bind(user_id.to_string())
            .bind(feed_id.to_string())
            .execute(self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    FeedmillError::Validation("already following this feed".into())
                }
                _ => FeedmillError::Database(e.to_string()),
            })?;

        let row = sqlx::query_as::<_, FeedFollowRow>(
            r#"
            SELECT ff.id, ff.created_at, ff.user_id, ff.feed_id,
                   u.name AS user_name, f.name AS feed_name
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        FeedFollow::try_from(row)
    }

    /// Remove a follow. Returns `false` if it did not exist.
    pub async fn delete(&self, user_id: Uuid, feed_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = $1 AND feed_id = $2")
            .bind(user_id.to_string())
            .bind(feed_id.to_string())
            .execute(self.pool)
            .await
            .map_err(|e| FeedmillError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// List the follows of a user, ordered by feed name.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<FeedFollow>> {
        let rows = sqlx::query_as::<_, FeedFollowRow>(
            r#"
            SELECT ff.id, ff.created_at, ff.user_id, ff.feed_id,
                   u.name AS user_name, f.name AS feed_name
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.user_id = $1
            ORDER BY f.name ASC, f.url ASC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        rows.into_iter().map(FeedFollow::try_from).collect()
    }
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a post.
    ///
    /// A post whose URL is already stored yields
    /// [`PostInsertError::DuplicateKey`] and leaves the existing row untouched.
    pub async fn insert(&self, new_post: &NewPost) -> std::result::Result<Post, PostInsertError> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: new_post.title.clone(),
            url: new_post.url.clone(),
            description: new_post.description.clone(),
            published_at: new_post.published_at,
            feed_id: new_post.feed_id,
        };

        sqlx::query(
            r#"
            INSERT INTO posts (id, created_at, updated_at, title, url, description,
                               published_at, feed_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(post.id.to_string())
        .bind(to_db_timestamp(&post.created_at))
        .bind(to_db_timestamp(&post.updated_at))
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(to_db_timestamp(&post.published_at))
        .bind(post.feed_id.to_string())
        .execute(self.pool)
        .await
        .map_err(|e| PostInsertError::from_sqlx(e, &post.url))?;

        Ok(post)
    }

    /// List the newest posts from feeds the user follows.
    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT p.id, p.created_at, p.updated_at, p.title, p.url, p.description,
                   p.published_at, p.feed_id
            FROM posts p
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            WHERE ff.user_id = $1
            ORDER BY p.published_at DESC, p.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        rows.into_iter().map(Post::try_from).collect()
    }

    /// Count the posts stored for a feed.
    pub async fn count_by_feed(&self, feed_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE feed_id = $1")
            .bind(feed_id.to_string())
            .fetch_one(self.pool)
            .await
            .map_err(|e| FeedmillError::Database(e.to_string()))?;

        Ok(count)
    }
}
