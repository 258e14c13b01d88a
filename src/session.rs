//! Persisted CLI session state.
//!
//! The session is a small JSON file recording which user is logged in.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{FeedmillError, Result};

/// Session contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Name of the logged-in user.
    #[serde(default)]
    pub current_user_name: Option<String>,
}

/// Session state stored in a JSON file.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Create a handle for the session file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the session. A missing file yields an empty session.
    pub fn load(&self) -> Result<Session> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}", self.path.display());
                return Ok(Session::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            FeedmillError::Config(format!(
                "invalid session file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Name of the logged-in user, if any.
    pub fn current_user_name(&self) -> Result<Option<String>> {
        Ok(self.load()?.current_user_name)
    }

    /// Record `name` as the logged-in user.
    pub fn set_current_user(&self, name: &str) -> Result<()> {
        let mut session = self.load()?;
        session.current_user_name = Some(name.to_string());
        self.save(&session)
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(session)
            .map_err(|e| FeedmillError::Config(format!("failed to encode session: {e}")))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
