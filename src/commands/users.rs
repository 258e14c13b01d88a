//! User management commands.

use futures::future::BoxFuture;
use tracing::info;

use super::{require_args, App, Command};
use crate::db::{NewUser, UserRepository};
use crate::{FeedmillError, Result};

/// `register <name>`: create a user and log in as them.
pub struct Register;

impl Command for Register {
    fn usage(&self) -> &'static str {
        "register <name>"
    }

    fn description(&self) -> &'static str {
        "Create a user and make it current"
    }

    fn run<'a>(&'a self, app: &'a App, args: &'a [String]) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            require_args(args, 1, self.usage())?;

            let user = UserRepository::new(app.db.pool())
                .create(&NewUser::new(args[0].as_str()))
                .await?;
            app.session.set_current_user(&user.name)?;
            info!("Registered user {}", user.name);

            Ok(format!(
                "User {} registered successfully!\nID: {}",
                user.name, user.id
            ))
        })
    }
}

/// `login <name>`: switch the current user.
pub struct Login;

impl Command for Login {
    fn usage(&self) -> &'static str {
        "login <name>"
    }

    fn description(&self) -> &'static str {
        "Make an existing user current"
    }

    fn run<'a>(&'a self, app: &'a App, args: &'a [String]) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            require_args(args, 1, self.usage())?;
            let name = &args[0];

            let user = UserRepository::new(app.db.pool())
                .get_by_name(name)
                .await?
                .ok_or_else(|| FeedmillError::NotFound(format!("user {name}")))?;
            app.session.set_current_user(&user.name)?;

            Ok(format!("User has been set to: {}", user.name))
        })
    }
}

/// `reset`: delete every user and everything they own.
pub struct Reset;

impl Command for Reset {
    fn usage(&self) -> &'static str {
        "reset"
    }

    fn description(&self) -> &'static str {
        "Delete all users, feeds, follows and posts"
    }

    fn run<'a>(&'a self, app: &'a App, _args: &'a [String]) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let deleted = UserRepository::new(app.db.pool()).delete_all().await?;
            info!("Deleted {} user(s)", deleted);
            Ok("Successfully deleted all users".to_string())
        })
    }
}

/// `users`: list users, marking the current one.
pub struct Users;

impl Command for Users {
    fn usage(&self) -> &'static str {
        "users"
    }

    fn description(&self) -> &'static str {
        "List all users"
    }

    fn run<'a>(&'a self, app: &'a App, _args: &'a [String]) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let current = app.session.current_user_name()?;
            let users = UserRepository::new(app.db.pool()).list().await?;

            let mut lines = vec!["All users:".to_string()];
            for user in users {
                if current.as_deref() == Some(user.name.as_str()) {
                    lines.push(format!("* {} (current)", user.name));
                } else {
                    lines.push(format!("* {}", user.name));
                }
            }
            Ok(lines.join("\n"))
        })
    }
}
