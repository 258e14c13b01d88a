//! End-to-end tests driving the command registry the way the binary does.

mod common;

use common::*;
use feedmill::commands::{App, CommandRegistry, Invocation};
use feedmill::{Config, FeedmillError, Result};

struct Harness {
    app: App,
    registry: CommandRegistry,
    _dir: tempfile::TempDir,
}

impl Harness {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.session.path = dir.path().join("session.json").display().to_string();
        let app = App::new(test_db().await, config).unwrap();
        Self {
            app,
            registry: CommandRegistry::standard(),
            _dir: dir,
        }
    }

    async fn run(&self, line: &[&str]) -> Result<String> {
        let invocation = Invocation::from_args(line.iter().copied())?;
        self.registry.dispatch(&self.app, &invocation).await
    }
}

#[tokio::test]
async fn test_full_flow() {
    let (base, _server) = spawn_fixture_server().await;
    let h = Harness::new().await;
    let feed_a = format!("{base}/a.xml");
    let feed_b = format!("{base}/b.xml");

    h.run(&["register", "alice"]).await.unwrap();
    h.run(&["addfeed", "Feed A", &feed_a]).await.unwrap();
    h.run(&["register", "bob"]).await.unwrap();
    h.run(&["addfeed", "Feed B", &feed_b]).await.unwrap();

    let users = h.run(&["users"]).await.unwrap();
    assert_eq!(users, "All users:\n* alice\n* bob (current)");

    let feeds = h.run(&["feeds"]).await.unwrap();
    assert!(feeds.contains("Feed: Feed A"));
    assert!(feeds.contains("Created by: bob"));

    let summary = h.run(&["agg", "0s"]).await.unwrap();
    assert!(summary.starts_with("Collected 2 feed(s): 4 new post(s)"));

    // Running again stores nothing new.
    let summary = h.run(&["agg", "0"]).await.unwrap();
    assert!(summary.contains("0 new post(s), 4 duplicate(s)"));

    h.run(&["follow", &feed_a]).await.unwrap();
    let following = h.run(&["following"]).await.unwrap();
    assert_eq!(following, "Feeds you're following:\n* Feed A\n* Feed B");

    let browse = h.run(&["browse", "--limit", "10"]).await.unwrap();
    assert_eq!(browse.matches("--- Post").count(), 4);

    h.run(&["unfollow", &feed_b]).await.unwrap();
    let browse = h.run(&["browse", "10"]).await.unwrap();
    assert_eq!(browse.matches("--- Post").count(), 2);
    assert!(browse.contains("Url: https://a.example.com/2"));

    h.run(&["login", "alice"]).await.unwrap();
    let following = h.run(&["following"]).await.unwrap();
    assert_eq!(following, "Feeds you're following:\n* Feed A");
}

#[tokio::test]
async fn test_login_required_commands() {
    let h = Harness::new().await;

    for line in [
        &["addfeed", "x", "https://example.com/rss"][..],
        &["follow", "https://example.com/rss"],
        &["unfollow", "https://example.com/rss"],
        &["following"],
        &["browse"],
    ] {
        let result = h.run(line).await;
        assert!(
            matches!(result, Err(FeedmillError::Auth(_))),
            "{line:?} should require login"
        );
    }
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let (base, _server) = spawn_fixture_server().await;
    let h = Harness::new().await;

    h.run(&["register", "alice"]).await.unwrap();
    h.run(&["addfeed", "Feed A", &format!("{base}/a.xml")]).await.unwrap();
    h.run(&["agg", "0"]).await.unwrap();
    assert_eq!(count_posts(&h.app.db).await, 2);

    h.run(&["reset"]).await.unwrap();
    assert_eq!(count_posts(&h.app.db).await, 0);
    assert_eq!(h.run(&["feeds"]).await.unwrap(), "No feeds registered yet.");

    // The session still names alice, who no longer exists.
    let result = h.run(&["following"]).await;
    assert!(matches!(result, Err(FeedmillError::Auth(_))));
}

#[tokio::test]
async fn test_agg_halts_on_failing_feed() {
    let (base, _server) = spawn_fixture_server().await;
    let h = Harness::new().await;

    h.run(&["register", "alice"]).await.unwrap();
    h.run(&["addfeed", "Broken", &format!("{base}/500.xml")]).await.unwrap();

    let result = h.run(&["agg", "0"]).await;
    assert!(matches!(result, Err(FeedmillError::Fetch(_))));
}

#[tokio::test]
async fn test_invalid_input() {
    let h = Harness::new().await;

    assert!(matches!(
        h.run(&["agg", "fast"]).await,
        Err(FeedmillError::Config(_))
    ));
    assert!(matches!(
        h.run(&["nope"]).await,
        Err(FeedmillError::Validation(_))
    ));
    assert!(matches!(h.run(&[]).await, Err(FeedmillError::Validation(_))));
    assert!(h.run(&["help"]).await.unwrap().contains("browse"));
}
