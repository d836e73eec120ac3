//! Refresh-token blacklist repository
//!
//! Consumed refresh tokens are recorded here so they can never
//! authenticate a refresh or logout again. Rows carry the token's own
//! expiry so the sweep can drop entries that could no longer verify
//! anyway.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Refresh-token blacklist repository trait
#[async_trait]
pub trait BlacklistRepository: Send + Sync {
    /// Record a consumed token; inserting the same token twice is a no-op
    async fn insert(&self, token: &str, user_id: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Whether the token has been consumed
    async fn contains(&self, token: &str) -> Result<bool>;

    /// Delete entries whose underlying token has expired
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based blacklist repository implementation
pub struct SqlxBlacklistRepository {
    pool: SqlitePool,
}

impl SqlxBlacklistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn BlacklistRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlacklistRepository for SqlxBlacklistRepository {
    async fn insert(&self, token: &str, user_id: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO refresh_token_blacklist (token, user_id, expires_at) \
             VALUES (?, ?, ?)",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .context("Failed to blacklist token")?;

        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM refresh_token_blacklist WHERE token = ?")
                .bind(token)
                .fetch_one(&self.pool)
                .await
                .context("Failed to check blacklist")?;

        Ok(count > 0)
    }

    async fn delete_expired(&self) -> Result<i64> {
        let result = sqlx::query("DELETE FROM refresh_token_blacklist WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to sweep blacklist")?;

        Ok(result.rows_affected() as i64)
    }
}
