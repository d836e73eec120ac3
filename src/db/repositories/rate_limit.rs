//! Rate-limit log repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::models::RouteCategory;

/// Rate-limit log repository trait
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Append an entry for `(ip, category, now)` and return the number of
    /// entries for that pair within the trailing window
    async fn record_and_count(
        &self,
        ip: &str,
        category: RouteCategory,
        window_start: DateTime<Utc>,
    ) -> Result<i64>;

    /// Delete entries older than the cutoff; returns rows removed
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<i64>;
}

/// SQLx-based rate-limit log repository implementation
pub struct SqlxRateLimitRepository {
    pool: SqlitePool,
}

impl SqlxRateLimitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn RateLimitRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RateLimitRepository for SqlxRateLimitRepository {
    async fn record_and_count(
        &self,
        ip: &str,
        category: RouteCategory,
        window_start: DateTime<Utc>,
    ) -> Result<i64> {
        sqlx::query("INSERT INTO rate_limit_log (ip, category, created_at) VALUES (?, ?, ?)")
            .bind(ip)
            .bind(category.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to record rate-limit entry")?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rate_limit_log \
             WHERE ip = ? AND category = ? AND created_at > ?",
        )
        .bind(ip)
        .bind(category.as_str())
        .bind(window_start)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count rate-limit entries")?;

        Ok(count)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let result = sqlx::query("DELETE FROM rate_limit_log WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .context("Failed to sweep rate-limit log")?;

        Ok(result.rows_affected() as i64)
    }
}
