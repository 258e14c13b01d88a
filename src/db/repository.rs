//! User repository for Feedmill.

use chrono::Utc;
use uuid::Uuid;

use super::user::{NewUser, User};
use super::{parse_id, DbPool};
use crate::datetime::{parse_db_timestamp, to_db_timestamp};
use crate::{FeedmillError, Result};

/// Row type for users from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: String,
    created_at: String,
    updated_at: String,
    name: String,
}

impl TryFrom<UserRow> for User {
    type Error = FeedmillError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: parse_id(&row.id)?,
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
            name: row.name,
        })
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Returns a validation error if the name is already taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        new_user.validate()?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            name: new_user.name.clone(),
        };

        sqlx::query(
            "INSERT INTO users (id, created_at, updated_at, name) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id.to_string())
        .bind(to_db_timestamp(&user.created_at))
        .bind(to_db_timestamp(&user.updated_at))
        .bind(&user.name)
        .execute(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                FeedmillError::Validation(format!("user {} already exists", new_user.name))
            }
            _ => FeedmillError::Database(e.to_string()),
        })?;

        Ok(user)
    }

    /// Get a user by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, created_at, updated_at, name FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    /// List all users ordered by name.
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, created_at, updated_at, name FROM users ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedmillError::Database(e.to_string()))?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Delete every user.
    ///
    /// Feeds, follows and posts are removed through cascading foreign keys.
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users")
            .execute(self.pool)
            .await
            .map_err(|e| FeedmillError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
