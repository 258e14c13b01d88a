//! Database schema and migrations for Feedmill.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded. Identifiers are UUIDs stored as text and timestamps are
//! RFC 3339 UTC strings, so the same SQL runs on SQLite and PostgreSQL.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users
    r#"
CREATE TABLE users (
    id          TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    name        TEXT NOT NULL UNIQUE
);
"#,
    // v2: Feeds, owned by the user who registered them
    r#"
CREATE TABLE feeds (
    id          TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    name        TEXT NOT NULL,
    url         TEXT NOT NULL UNIQUE,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX idx_feeds_user_id ON feeds(user_id);
"#,
    // v3: Follow relationship between users and feeds
    r#"
CREATE TABLE feed_follows (
    id          TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    feed_id     TEXT NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    UNIQUE (user_id, feed_id)
);

CREATE INDEX idx_feed_follows_feed_id ON feed_follows(feed_id);
"#,
    // v4: Track when each feed was last checked (NULL = never)
    r#"
ALTER TABLE feeds ADD COLUMN last_fetched_at TEXT;

CREATE INDEX idx_feeds_last_fetched_at ON feeds(last_fetched_at);
"#,
    // v5: Posts; the URL is the idempotency key for ingestion
    r#"
CREATE TABLE posts (
    id            TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    title         TEXT,
    url           TEXT NOT NULL UNIQUE,
    description   TEXT,
    published_at  TEXT NOT NULL,
    feed_id       TEXT NOT NULL REFERENCES feeds(id) ON DELETE CASCADE
);

CREATE INDEX idx_posts_feed_id ON posts(feed_id);
CREATE INDEX idx_posts_published_at ON posts(published_at);
"#,
];
