//! The `browse` command.

use futures::future::BoxFuture;

use super::{App, UserCommand};
use crate::datetime::format_utc_datetime;
use crate::db::User;
use crate::feed::PostRepository;
use crate::{FeedmillError, Result};

/// Number of posts shown when no limit is given.
pub const DEFAULT_BROWSE_LIMIT: i64 = 2;

/// Longest description shown, including the ellipsis.
const MAX_DESCRIPTION_CHARS: usize = 100;

/// `browse [limit]`: show the newest posts from followed feeds.
pub struct Browse;

impl UserCommand for Browse {
    fn usage(&self) -> &'static str {
        "browse [limit | --limit N]"
    }

    fn description(&self) -> &'static str {
        "Show the newest posts from followed feeds"
    }

    fn run<'a>(
        &'a self,
        app: &'a App,
        user: &'a User,
        args: &'a [String],
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let limit = parse_limit(args, self.usage())?;
            let posts = PostRepository::new(app.db.pool())
                .list_for_user(user.id, limit)
                .await?;

            if posts.is_empty() {
                return Ok("No posts found. Try following some feeds first!".to_string());
            }

            let display = &app.config.display;
            let mut lines = vec!["Browsing posts...".to_string()];
            for (i, post) in posts.iter().enumerate() {
                lines.push(format!("--- Post {} ---", i + 1));
                lines.push(format!("Title: {}", post.title.as_deref().unwrap_or("")));
                lines.push(format!("Url: {}", post.url));
                lines.push(format!(
                    "Published: {}",
                    format_utc_datetime(&post.published_at, &display.timezone, &display.date_format)
                ));
                lines.push(format!(
                    "Description: {}",
                    truncate_description(post.description.as_deref().unwrap_or(""))
                ));
                lines.push(format!("Feed ID: {}", post.feed_id));
            }
            Ok(lines.join("\n"))
        })
    }
}

/// Accepts `browse`, `browse 5` and `browse --limit 5` (or `--limit=5`).
fn parse_limit(args: &[String], usage: &str) -> Result<i64> {
    let raw = match args {
        [] => return Ok(DEFAULT_BROWSE_LIMIT),
        [flag, value] if flag == "--limit" || flag == "-limit" => value.as_str(),
        [single] => single
            .strip_prefix("--limit=")
            .or_else(|| single.strip_prefix("-limit="))
            .unwrap_or(single),
        _ => return Err(FeedmillError::Validation(format!("usage: {usage}"))),
    };

    match raw.parse::<i64>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(FeedmillError::Validation(format!(
            "limit must be a positive integer, got {raw:?}"
        ))),
    }
}

/// Shorten a description to at most 100 characters, ending in `...` when cut.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }
    let kept: String = description.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
    format!("{kept}...")
}
