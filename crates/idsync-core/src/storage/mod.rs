//! Database access layer for user persistence.
//!
//! The repository translates between domain models and the database schema.
//! All database operations go through this module; handlers never issue SQL
//! directly.

use std::sync::Arc;

use sqlx::PgPool;

pub mod users;

use crate::error::Result;

/// Container for repository instances providing unified database access.
///
/// Entry point for all database operations. Holds a shared connection pool
/// and exposes type-safe access to each repository.
#[derive(Clone)]
pub struct Storage {
    /// Repository for user record operations.
    pub users: Arc<users::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self { users: Arc::new(users::Repository::new(pool)) }
    }

    /// Performs a health check on the database connection.
    ///
    /// Executes a trivial query to verify connectivity. Used by the
    /// readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.users.pool()).await?;

        Ok(())
    }
}
