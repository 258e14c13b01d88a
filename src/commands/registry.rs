//! Command registry and dispatch.

use std::collections::HashMap;

use tracing::debug;

use super::{
    AddFeed, Agg, App, Browse, Command, Feeds, Follow, Following, Login, Register, RequireLogin,
    Reset, Unfollow, Users,
};
use crate::{FeedmillError, Result};

/// A parsed command line: the command name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Command name.
    pub name: String,
    /// Remaining arguments.
    pub args: Vec<String>,
}

impl Invocation {
    /// Build an invocation from command-line arguments (without the program name).
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let name = args
            .next()
            .ok_or_else(|| FeedmillError::Validation("not enough arguments, try help".into()))?;
        Ok(Self {
            name,
            args: args.collect(),
        })
    }
}

/// Immutable map from command name to handler.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Add a command under `name`.
    pub fn with(mut self, name: &'static str, command: impl Command + 'static) -> Self {
        self.commands.insert(name, Box::new(command));
        self
    }

    /// Registry holding every built-in command.
    pub fn standard() -> Self {
        Self::new()
            .with("register", Register)
            .with("login", Login)
            .with("reset", Reset)
            .with("users", Users)
            .with("agg", Agg)
            .with("addfeed", RequireLogin(AddFeed))
            .with("feeds", Feeds)
            .with("follow", RequireLogin(Follow))
            .with("unfollow", RequireLogin(Unfollow))
            .with("following", RequireLogin(Following))
            .with("browse", RequireLogin(Browse))
    }

    /// Look up a command by name.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Help text listing every command.
    pub fn help(&self) -> String {
        let mut lines = vec!["Usage: feedmill <command> [args...]".to_string(), String::new()];
        lines.push("Commands:".to_string());
        for name in self.names() {
            if let Some(command) = self.get(name) {
                lines.push(format!("  {:<28} {}", command.usage(), command.description()));
            }
        }
        lines.push(format!("  {:<28} {}", "help", "Show this help"));
        lines.join("\n")
    }

    /// Run the command named by `invocation`.
    pub async fn dispatch(&self, app: &App, invocation: &Invocation) -> Result<String> {
        if invocation.name == "help" {
            return Ok(self.help());
        }

        let command = self.get(&invocation.name).ok_or_else(|| {
            FeedmillError::Validation(format!("{} is an invalid command", invocation.name))
        })?;

        debug!("Running command {} {:?}", invocation.name, invocation.args);
        command.run(app, &invocation.args).await
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_from_args() {
        let inv = Invocation::from_args(["addfeed", "Blog", "https://example.com/rss"]).unwrap();
        assert_eq!(inv.name, "addfeed");
        assert_eq!(inv.args, vec!["Blog", "https://example.com/rss"]);

        let empty = Invocation::from_args(Vec::<String>::new());
        assert!(matches!(empty, Err(FeedmillError::Validation(_))));
    }

    #[test]
    fn test_standard_registry_names() {
        let registry = CommandRegistry::standard();
        assert_eq!(
            registry.names(),
            vec![
                "addfeed", "agg", "browse", "feeds", "follow", "following", "login", "register",
                "reset", "unfollow", "users"
            ]
        );
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_help_lists_commands() {
        let help = CommandRegistry::standard().help();
        assert!(help.contains("addfeed <name> <url>"));
        assert!(help.contains("agg <interval>"));
        assert!(help.contains("help"));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_dispatch() {
        use crate::commands::tests::test_app;

        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir).await;
        let registry = CommandRegistry::standard();

        let out = registry
            .dispatch(&app, &Invocation::from_args(["register", "alice"]).unwrap())
            .await
            .unwrap();
        assert!(out.contains("alice"));

        let unknown = registry
            .dispatch(&app, &Invocation::from_args(["frobnicate"]).unwrap())
            .await;
        assert!(matches!(unknown, Err(FeedmillError::Validation(msg)) if msg.contains("frobnicate")));

        let help = registry
            .dispatch(&app, &Invocation::from_args(["help"]).unwrap())
            .await
            .unwrap();
        assert!(help.starts_with("Usage: feedmill"));
    }
}
