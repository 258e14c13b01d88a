//! Feed and follow commands.

use futures::future::BoxFuture;
use tracing::info;

use super::{require_args, App, Command, UserCommand};
use crate::db::User;
use crate::feed::{
    validate_url, Feed, FeedFollowRepository, FeedRepository, FeedStore, NewFeed,
};
use crate::{FeedmillError, Result};

async fn feed_by_url(app: &App, url: &str) -> Result<Feed> {
    app.db
        .get_feed_by_url(url)
        .await?
        .ok_or_else(|| FeedmillError::NotFound(format!("feed {url}")))
}

/// `addfeed <name> <url>`: register a feed and follow it.
pub struct AddFeed;

impl UserCommand for AddFeed {
    fn usage(&self) -> &'static str {
        "addfeed <name> <url>"
    }

    fn description(&self) -> &'static str {
        "Register a feed and follow it"
    }

    fn run<'a>(
        &'a self,
        app: &'a App,
        user: &'a User,
        args: &'a [String],
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            require_args(args, 2, self.usage())?;
            let (name, url) = (&args[0], &args[1]);
            validate_url(url).map_err(|e| FeedmillError::Validation(e.to_string()))?;

            let feed = FeedRepository::new(app.db.pool())
                .create_followed(&NewFeed::new(name.as_str(), url.as_str(), user.id))
                .await?;
            info!("User {} added feed {}", user.name, feed.url);

            Ok(format!(
                "Feed added:\n  Name: {}\n  URL: {}\n  ID: {}\nFollowed by: {}",
                feed.name, feed.url, feed.id, user.name
            ))
        })
    }
}

/// `feeds`: list every feed with its owner.
pub struct Feeds;

impl Command for Feeds {
    fn usage(&self) -> &'static str {
        "feeds"
    }

    fn description(&self) -> &'static str {
        "List all feeds"
    }

    fn run<'a>(&'a self, app: &'a App, _args: &'a [String]) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let feeds = FeedRepository::new(app.db.pool()).list_with_owners().await?;
            if feeds.is_empty() {
                return Ok("No feeds registered yet.".to_string());
            }

            let entries: Vec<String> = feeds
                .iter()
                .map(|f| {
                    format!(
                        "Feed: {}\nURL: {}\nCreated by: {}",
                        f.feed.name, f.feed.url, f.user_name
                    )
                })
                .collect();
            Ok(entries.join("\n\n"))
        })
    }
}

/// `follow <url>`: follow an existing feed.
pub struct Follow;

impl UserCommand for Follow {
    fn usage(&self) -> &'static str {
        "follow <url>"
    }

    fn description(&self) -> &'static str {
        "Follow a registered feed"
    }

    fn run<'a>(
        &'a self,
        app: &'a App,
        user: &'a User,
        args: &'a [String],
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            require_args(args, 1, self.usage())?;
            let feed = feed_by_url(app, &args[0]).await?;

            let follow = FeedFollowRepository::new(app.db.pool())
                .create(user.id, feed.id)
                .await?;

            Ok(format!(
                "Feed: {}\nCurrent User: {}",
                follow.feed_name, follow.user_name
            ))
        })
    }
}

/// `unfollow <url>`: stop following a feed.
pub struct Unfollow;

impl UserCommand for Unfollow {
    fn usage(&self) -> &'static str {
        "unfollow <url>"
    }

    fn description(&self) -> &'static str {
        "Stop following a feed"
    }

    fn run<'a>(
        &'a self,
        app: &'a App,
        user: &'a User,
        args: &'a [String],
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            require_args(args, 1, self.usage())?;
            let feed = feed_by_url(app, &args[0]).await?;

            let removed = FeedFollowRepository::new(app.db.pool())
                .delete(user.id, feed.id)
                .await?;
            if !removed {
                return Err(FeedmillError::NotFound(format!(
                    "follow of {} by {}",
                    feed.url, user.name
                )));
            }

            Ok(format!("Unfollowed {}", feed.name))
        })
    }
}

/// `following`: list the feeds the current user follows.
pub struct Following;

impl UserCommand for Following {
    fn usage(&self) -> &'static str {
        "following"
    }

    fn description(&self) -> &'static str {
        "List followed feeds"
    }

    fn run<'a>(
        &'a self,
        app: &'a App,
        user: &'a User,
        _args: &'a [String],
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let follows = FeedFollowRepository::new(app.db.pool())
                .list_for_user(user.id)
                .await?;

            let mut lines = vec!["Feeds you're following:".to_string()];
            lines.extend(follows.into_iter().map(|f| format!("* {}", f.feed_name)));
            Ok(lines.join("\n"))
        })
    }
}
