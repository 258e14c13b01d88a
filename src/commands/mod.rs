//! Command-line control plane for Feedmill.
//!
//! Each subcommand is a [`Command`] registered by name in a
//! [`CommandRegistry`]. Commands that act on behalf of a user implement
//! [`UserCommand`] and are wrapped in [`RequireLogin`], which resolves the
//! logged-in user from the session before running them.

mod aggregate;
mod browse;
mod feeds;
mod registry;
mod users;

pub use aggregate::Agg;
pub use browse::{truncate_description, Browse, DEFAULT_BROWSE_LIMIT};
pub use feeds::{AddFeed, Feeds, Follow, Following, Unfollow};
pub use registry::{CommandRegistry, Invocation};
pub use users::{Login, Register, Reset, Users};

use futures::future::BoxFuture;

use crate::config::Config;
use crate::db::{Database, User, UserRepository};
use crate::feed::FeedFetcher;
use crate::session::SessionFile;
use crate::{FeedmillError, Result};

/// Shared state handed to every command.
#[derive(Debug)]
pub struct App {
    /// Database connection.
    pub db: Database,
    /// Loaded configuration.
    pub config: Config,
    /// Session state file.
    pub session: SessionFile,
    /// HTTP fetcher for feeds.
    pub fetcher: FeedFetcher,
}

impl App {
    /// Build the application state from an open database and configuration.
    pub fn new(db: Database, config: Config) -> Result<Self> {
        let fetcher = FeedFetcher::new(&config.fetcher)?;
        let session = SessionFile::new(&config.session.path);
        Ok(Self {
            db,
            config,
            session,
            fetcher,
        })
    }

    /// Resolve the logged-in user.
    pub async fn current_user(&self) -> Result<User> {
        let name = self
            .session
            .current_user_name()?
            .ok_or_else(|| FeedmillError::Auth("not logged in".to_string()))?;

        UserRepository::new(self.db.pool())
            .get_by_name(&name)
            .await?
            .ok_or_else(|| FeedmillError::Auth(format!("current user {name} does not exist")))
    }
}

/// A named subcommand.
pub trait Command: Send + Sync {
    /// Argument synopsis, e.g. `addfeed <name> <url>`.
    fn usage(&self) -> &'static str;

    /// One-line description for `help`.
    fn description(&self) -> &'static str;

    /// Run the command and return the text to print.
    fn run<'a>(&'a self, app: &'a App, args: &'a [String]) -> BoxFuture<'a, Result<String>>;
}

/// A subcommand that acts on behalf of the logged-in user.
pub trait UserCommand: Send + Sync {
    /// Argument synopsis.
    fn usage(&self) -> &'static str;

    /// One-line description for `help`.
    fn description(&self) -> &'static str;

    /// Run the command for `user`.
    fn run<'a>(
        &'a self,
        app: &'a App,
        user: &'a User,
        args: &'a [String],
    ) -> BoxFuture<'a, Result<String>>;
}

/// Adapts a [`UserCommand`] into a [`Command`] that requires a login.
pub struct RequireLogin<C>(pub C);

impl<C: UserCommand> Command for RequireLogin<C> {
    fn usage(&self) -> &'static str {
        self.0.usage()
    }

    fn description(&self) -> &'static str {
        self.0.description()
    }

    fn run<'a>(&'a self, app: &'a App, args: &'a [String]) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let user = app.current_user().await?;
            self.0.run(app, &user, args).await
        })
    }
}

/// Fail with a usage error unless at least `count` arguments were given.
pub(crate) fn require_args(args: &[String], count: usize, usage: &str) -> Result<()> {
    if args.len() < count {
        return Err(FeedmillError::Validation(format!("usage: {usage}")));
    }
    Ok(())
}

#[cfg(all(test, feature = "sqlite"))]
pub(crate) mod tests {
    use super::*;

    /// App over an in-memory database with a session file in a temp dir.
    pub(crate) async fn test_app(dir: &tempfile::TempDir) -> App {
        let mut config = Config::default();
        config.session.path = dir.path().join("session.json").display().to_string();
        let db = Database::open_in_memory().await.unwrap();
        App::new(db, config).unwrap()
    }

    pub(crate) fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    struct WhoAmI;

    impl UserCommand for WhoAmI {
        fn usage(&self) -> &'static str {
            "whoami"
        }

        fn description(&self) -> &'static str {
            "Print the current user"
        }

        fn run<'a>(
            &'a self,
            _app: &'a App,
            user: &'a User,
            _args: &'a [String],
        ) -> BoxFuture<'a, Result<String>> {
            Box::pin(async move { Ok(user.name.clone()) })
        }
    }

    #[tokio::test]
    async fn test_require_login_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir).await;

        let result = RequireLogin(WhoAmI).run(&app, &[]).await;
        assert!(matches!(result, Err(FeedmillError::Auth(msg)) if msg.contains("not logged in")));
    }

    #[tokio::test]
    async fn test_require_login_with_deleted_user() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir).await;
        app.session.set_current_user("ghost").unwrap();

        let result = RequireLogin(WhoAmI).run(&app, &[]).await;
        assert!(matches!(result, Err(FeedmillError::Auth(msg)) if msg.contains("ghost")));
    }

    #[tokio::test]
    async fn test_require_login_forwards_user() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir).await;
        UserRepository::new(app.db.pool())
            .create(&crate::db::NewUser::new("alice"))
            .await
            .unwrap();
        app.session.set_current_user("alice").unwrap();

        let out = RequireLogin(WhoAmI).run(&app, &[]).await.unwrap();
        assert_eq!(out, "alice");
        assert_eq!(RequireLogin(WhoAmI).usage(), "whoami");
    }

    #[test]
    fn test_require_args() {
        assert!(require_args(&args(&["a"]), 1, "x <a>").is_ok());
        let err = require_args(&[], 1, "x <a>").unwrap_err();
        assert_eq!(err.to_string(), "validation error: usage: x <a>");
    }
}
