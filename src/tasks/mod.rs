//! Background cleanup tasks
//!
//! Three periodic sweeps keep the advisory tables bounded: rate-limit log
//! entries older than the counting window, expired device sessions, and
//! blacklist entries whose tokens could no longer verify anyway. Each
//! sweep runs on its own interval ticker and all of them stop together
//! through a watch channel owned by the process lifecycle.
//!
//! A sweep failure is logged and retried implicitly on the next tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{CleanupConfig, RateLimitConfig};
use crate::db::repositories::{BlacklistRepository, DeviceRepository};
use crate::services::RateLimitService;

/// Handle to the running cleanup tasks
pub struct CleanupTasks {
    stop: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl CleanupTasks {
    /// Spawn the three sweep loops.
    ///
    /// The rate-limit sweep cadence is independent from the counting
    /// window; both come from configuration.
    pub fn spawn(
        rate_limit: &RateLimitConfig,
        cleanup: &CleanupConfig,
        rate_limiter: Arc<RateLimitService>,
        devices: Arc<dyn DeviceRepository>,
        blacklist: Arc<dyn BlacklistRepository>,
    ) -> Self {
        let (stop, _) = watch::channel(false);

        let handles = vec![
            spawn_sweeper(
                "rate_limit_log",
                Duration::from_secs(rate_limit.sweep_interval_secs.max(1)),
                stop.subscribe(),
                move || {
                    let limiter = rate_limiter.clone();
                    async move { limiter.sweep().await }
                },
            ),
            spawn_sweeper(
                "devices",
                Duration::from_secs(cleanup.device_sweep_secs.max(1)),
                stop.subscribe(),
                move || {
                    let devices = devices.clone();
                    async move { devices.delete_expired().await }
                },
            ),
            spawn_sweeper(
                "refresh_token_blacklist",
                Duration::from_secs(cleanup.blacklist_sweep_secs.max(1)),
                stop.subscribe(),
                move || {
                    let blacklist = blacklist.clone();
                    async move { blacklist.delete_expired().await }
                },
            ),
        ];

        Self { stop, handles }
    }

    /// Stop every sweep loop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// One sweep loop: tick, delete-by-predicate, repeat until stopped.
fn spawn_sweeper<F, Fut>(
    name: &'static str,
    period: Duration,
    mut stop: watch::Receiver<bool>,
    sweep: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<i64>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match sweep().await {
                        Ok(0) => {}
                        Ok(deleted) => {
                            tracing::debug!(task = name, deleted, "cleanup sweep");
                        }
                        Err(e) => {
                            tracing::warn!(task = name, error = ?e, "cleanup sweep failed");
                        }
                    }
                }
                _ = stop.changed() => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    use crate::db::repositories::{
        RateLimitRepository, SqlxBlacklistRepository, SqlxDeviceRepository,
        SqlxRateLimitRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{DeviceSession, RouteCategory};

    async fn setup_pool() -> sqlx::SqlitePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    fn expired_device(device_id: &str) -> DeviceSession {
        DeviceSession {
            user_id: "u1".into(),
            device_id: device_id.into(),
            ip: "127.0.0.1".into(),
            user_agent: "test".into(),
            last_active_at: Utc::now() - ChronoDuration::seconds(120),
            expires_at: Utc::now() - ChronoDuration::seconds(60),
        }
    }

    #[tokio::test]
    async fn test_sweeper_deletes_expired_rows() {
        let pool = setup_pool().await;
        let devices = SqlxDeviceRepository::boxed(pool);

        devices.upsert(&expired_device("d1")).await.unwrap();
        devices.upsert(&expired_device("d2")).await.unwrap();

        let (stop, rx) = watch::channel(false);
        let sweeper = {
            let devices = devices.clone();
            spawn_sweeper("devices", Duration::from_millis(10), rx, move || {
                let devices = devices.clone();
                async move { devices.delete_expired().await }
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(devices.list_by_user("u1").await.unwrap().is_empty());

        stop.send(true).unwrap();
        sweeper.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_survives_failures() {
        let (stop, rx) = watch::channel(false);
        let sweeper = spawn_sweeper("failing", Duration::from_millis(5), rx, || async {
            Err(anyhow::anyhow!("sweep failed"))
        });

        // A failing sweep must not kill the loop; stop still works
        tokio::time::sleep(Duration::from_millis(30)).await;
        stop.send(true).unwrap();
        sweeper.await.unwrap();
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let pool = setup_pool().await;
        let rate_limit_repo = SqlxRateLimitRepository::boxed(pool.clone());
        let devices = SqlxDeviceRepository::boxed(pool.clone());
        let blacklist = SqlxBlacklistRepository::boxed(pool);

        // Stale entries for each sweep target
        rate_limit_repo
            .record_and_count("1.2.3.4", RouteCategory::Login, Utc::now())
            .await
            .unwrap();
        devices.upsert(&expired_device("d1")).await.unwrap();
        blacklist
            .insert("tok", "u1", Utc::now() - ChronoDuration::seconds(60))
            .await
            .unwrap();

        let mut rate_limit_config = crate::config::RateLimitConfig::default();
        rate_limit_config.window_secs = 0;
        rate_limit_config.sweep_interval_secs = 1;
        let mut cleanup_config = CleanupConfig::default();
        cleanup_config.device_sweep_secs = 1;
        cleanup_config.blacklist_sweep_secs = 1;

        let rate_limiter = Arc::new(RateLimitService::new(
            rate_limit_repo,
            rate_limit_config.clone(),
        ));

        let tasks = CleanupTasks::spawn(
            &rate_limit_config,
            &cleanup_config,
            rate_limiter,
            devices.clone(),
            blacklist.clone(),
        );

        // First ticks fire immediately
        tokio::time::sleep(Duration::from_millis(100)).await;
        tasks.shutdown().await;

        assert!(devices.list_by_user("u1").await.unwrap().is_empty());
        assert!(!blacklist.contains("tok").await.unwrap());
    }
}
