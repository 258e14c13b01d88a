//! User model for Feedmill.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: Uuid,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// User name (unique).
    pub name: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// User name.
    pub name: String,
}

impl NewUser {
    /// Create a new user request.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Validate the user name.
    ///
    /// Names must be non-empty, at most 64 characters, and free of whitespace.
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(crate::FeedmillError::Validation(
                "user name must not be empty".to_string(),
            ));
        }
        if self.name.chars().count() > 64 {
            return Err(crate::FeedmillError::Validation(
                "user name must be at most 64 characters".to_string(),
            ));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(crate::FeedmillError::Validation(
                "user name must not contain whitespace".to_string(),
            ));
        }
        Ok(())
    }
}
