//! IP rate limiting over the request log
//!
//! Every guarded request appends a `(ip, category)` entry and is judged
//! against the count within the trailing window. The ceiling applies per
//! category, so login attempts don't consume the registration budget.

use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::config::RateLimitConfig;
use crate::db::repositories::RateLimitRepository;
use crate::models::RouteCategory;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Rejected; retry after the window elapses (seconds)
    Limited { retry_after_secs: i64 },
}

/// Rate limiting service
pub struct RateLimitService {
    repo: Arc<dyn RateLimitRepository>,
    config: RateLimitConfig,
}

impl RateLimitService {
    pub fn new(repo: Arc<dyn RateLimitRepository>, config: RateLimitConfig) -> Self {
        Self { repo, config }
    }

    /// Record the request and decide whether it stays under the ceiling.
    ///
    /// The request that lands at `ceiling + 1` within the window is the
    /// first one rejected.
    pub async fn check(&self, ip: &str, category: RouteCategory) -> Result<RateLimitDecision> {
        let window_start = Utc::now() - Duration::seconds(self.config.window_secs);
        let count = self.repo.record_and_count(ip, category, window_start).await?;

        if count > self.config.ceiling(category) {
            Ok(RateLimitDecision::Limited {
                retry_after_secs: self.config.window_secs,
            })
        } else {
            Ok(RateLimitDecision::Allowed)
        }
    }

    /// Delete log entries older than the window; returns rows removed.
    pub async fn sweep(&self) -> Result<i64> {
        let cutoff = Utc::now() - Duration::seconds(self.config.window_secs);
        self.repo.delete_older_than(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxRateLimitRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup(config: RateLimitConfig) -> RateLimitService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        RateLimitService::new(SqlxRateLimitRepository::boxed(pool), config)
    }

    #[tokio::test]
    async fn test_ceiling_plus_one_is_rejected() {
        let mut config = RateLimitConfig::default();
        config.login_max = 3;
        let limiter = setup(config).await;

        for _ in 0..3 {
            assert_eq!(
                limiter.check("1.2.3.4", RouteCategory::Login).await.unwrap(),
                RateLimitDecision::Allowed
            );
        }
        assert!(matches!(
            limiter.check("1.2.3.4", RouteCategory::Login).await.unwrap(),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn test_categories_do_not_interfere() {
        let mut config = RateLimitConfig::default();
        config.login_max = 1;
        config.registration_max = 1;
        let limiter = setup(config).await;

        limiter.check("1.2.3.4", RouteCategory::Login).await.unwrap();
        // Login budget is spent, registration's is not
        assert!(matches!(
            limiter.check("1.2.3.4", RouteCategory::Login).await.unwrap(),
            RateLimitDecision::Limited { .. }
        ));
        assert_eq!(
            limiter
                .check("1.2.3.4", RouteCategory::Registration)
                .await
                .unwrap(),
            RateLimitDecision::Allowed
        );
    }

    #[tokio::test]
    async fn test_addresses_do_not_interfere() {
        let mut config = RateLimitConfig::default();
        config.login_max = 1;
        let limiter = setup(config).await;

        limiter.check("1.2.3.4", RouteCategory::Login).await.unwrap();
        assert_eq!(
            limiter.check("5.6.7.8", RouteCategory::Login).await.unwrap(),
            RateLimitDecision::Allowed
        );
    }

    #[tokio::test]
    async fn test_count_resets_after_window() {
        // Zero-length window: every prior entry is already outside it
        let mut config = RateLimitConfig::default();
        config.window_secs = 0;
        config.login_max = 1;
        let limiter = setup(config).await;

        for _ in 0..5 {
            assert_eq!(
                limiter.check("1.2.3.4", RouteCategory::Login).await.unwrap(),
                RateLimitDecision::Allowed
            );
        }
    }

    #[tokio::test]
    async fn test_sweep_trims_the_log() {
        let mut config = RateLimitConfig::default();
        config.window_secs = 0;
        let limiter = setup(config).await;

        limiter.check("1.2.3.4", RouteCategory::Login).await.unwrap();
        limiter.check("1.2.3.4", RouteCategory::Login).await.unwrap();

        // With a zero window, everything already written is sweepable
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let deleted = limiter.sweep().await.unwrap();
        assert_eq!(deleted, 2);
    }
}
