//! Repository for user database operations.
//!
//! The "user creator" behind the webhook receiver: a single insert that
//! returns the persisted row. Uniqueness of the external identity
//! identifier is enforced by the store, not by this code.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    error::Result,
    models::{NewUser, User},
};

/// Repository for user database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Inserts a user and returns the persisted record.
    ///
    /// The local identifier and creation timestamp are generated by the
    /// database. No validation happens here beyond what the store enforces;
    /// concurrent deliveries for the same external identifier race on the
    /// unique index and the loser surfaces a constraint violation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConstraintViolation` when the external identifier
    /// already exists, `CoreError::Database` for any other store failure.
    pub async fn create(&self, user: &NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (external_id, email, username, photo_url, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, external_id, email, username, photo_url,
                      first_name, last_name, created_at
            ",
        )
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.photo_url)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&*self.pool)
        .await?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repository_can_be_created() {
        let pool = sqlx::PgPool::connect_lazy("postgresql://test").unwrap();
        let _repo = Repository::new(Arc::new(pool));
    }
}
