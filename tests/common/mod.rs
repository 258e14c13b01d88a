//! Test helpers for integration tests.
//!
//! Provides a local HTTP server serving fixture feeds, plus helpers for
//! setting up users and feeds in an in-memory database.

#![allow(dead_code)]

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;

use feedmill::config::FetcherConfig;
use feedmill::feed::FeedRepository;
use feedmill::{Database, Feed, FeedFetcher, NewFeed, NewUser, User, UserRepository};

/// Feed with two well-formed items.
pub const FEED_A: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Feed A</title>
    <link>https://a.example.com</link>
    <description>First fixture</description>
    <item>
      <title>A one</title>
      <link>https://a.example.com/1</link>
      <description>First post</description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>A two</title>
      <link>https://a.example.com/2</link>
      <description>Second post</description>
      <pubDate>Tue, 03 Jan 2006 15:04:05 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

/// Feed with one item in ISO form and one with an unparseable date.
pub const FEED_B: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Feed B</title>
    <link>https://b.example.com</link>
    <description>Second fixture</description>
    <item>
      <title>B one</title>
      <link>https://b.example.com/1</link>
      <pubDate>2024-05-01T08:30:00Z</pubDate>
    </item>
    <item>
      <title>B undated</title>
      <link>https://b.example.com/2</link>
      <pubDate>sometime last week</pubDate>
    </item>
  </channel>
</rss>"#;

/// Feed whose text is entity-encoded twice.
pub const FEED_ENTITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Caf&amp;eacute; Feed</title>
    <link>https://cafe.example.com</link>
    <description>Fish &amp;amp; Chips</description>
    <item>
      <title>Caf&amp;eacute; opens</title>
      <link>https://cafe.example.com/opens</link>
      <description>Caf&amp;eacute; &amp;amp; bar</description>
      <pubDate>2 Jan 2006 15:04:05 -0700</pubDate>
    </item>
  </channel>
</rss>"#;

fn rss(body: &'static str) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/rss+xml")], body)
}

fn endless_body() -> impl IntoResponse {
    let chunks = futures::stream::repeat_with(|| Ok::<_, Infallible>(Bytes::from(vec![b' '; 4096])));
    (
        [(header::CONTENT_TYPE, "application/rss+xml")],
        Body::from_stream(chunks),
    )
}

/// Start the fixture server. Returns its base URL (no trailing slash).
///
/// Routes:
/// - `/a.xml`, `/b.xml`, `/entities.xml`: fixture feeds
/// - `/500.xml`: 500 with a valid RSS body
/// - `/missing.xml`: 404
/// - `/html`: an HTML page with status 200
/// - `/endless.xml`: chunked body without Content-Length that never ends
pub async fn spawn_fixture_server() -> (String, JoinHandle<()>) {
    let app = Router::new()
        .route("/a.xml", get(|| async { rss(FEED_A) }))
        .route("/b.xml", get(|| async { rss(FEED_B) }))
        .route("/entities.xml", get(|| async { rss(FEED_ENTITIES) }))
        .route(
            "/500.xml",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, FEED_A) }),
        )
        .route("/endless.xml", get(|| async { endless_body() }))
        .route(
            "/html",
            get(|| async { "<html><head><title>Hi</title></head><body></body></html>" }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{address}"), handle)
}

/// A URL on a port nothing listens on.
pub async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{address}/feed.xml")
}

/// Open a fresh in-memory database.
pub async fn test_db() -> Database {
    Database::open_in_memory().await.unwrap()
}

/// Fetcher with default configuration.
pub fn fetcher() -> FeedFetcher {
    FeedFetcher::new(&FetcherConfig::default()).unwrap()
}

/// Create a user.
pub async fn create_user(db: &Database, name: &str) -> User {
    UserRepository::new(db.pool())
        .create(&NewUser::new(name))
        .await
        .unwrap()
}

/// Register a feed owned by `user`.
pub async fn create_feed(db: &Database, user: &User, name: &str, url: &str) -> Feed {
    FeedRepository::new(db.pool())
        .create(&NewFeed::new(name, url, user.id))
        .await
        .unwrap()
}

/// Reload a feed by ID.
pub async fn reload_feed(db: &Database, feed: &Feed) -> Feed {
    FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap()
}

/// Count all stored posts.
pub async fn count_posts(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(db.pool())
        .await
        .unwrap()
}
