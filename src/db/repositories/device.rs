//! Device session repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::DeviceSession;

/// Device session repository trait
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Insert or replace the row for `(user_id, device_id)`
    async fn upsert(&self, session: &DeviceSession) -> Result<()>;

    /// All sessions for a user, most recently active first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<DeviceSession>>;

    /// Get one session
    async fn get(&self, user_id: &str, device_id: &str) -> Result<Option<DeviceSession>>;

    /// Look up a session by device id alone (for foreign-device checks)
    async fn get_by_device_id(&self, device_id: &str) -> Result<Option<DeviceSession>>;

    /// Delete one session; false when already absent
    async fn delete(&self, user_id: &str, device_id: &str) -> Result<bool>;

    /// Delete every session of the user except the given device
    async fn delete_all_except(&self, user_id: &str, device_id: &str) -> Result<i64>;

    /// Delete sessions whose refresh token has expired
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based device session repository implementation
pub struct SqlxDeviceRepository {
    pool: SqlitePool,
}

impl SqlxDeviceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn DeviceRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DeviceRepository for SqlxDeviceRepository {
    async fn upsert(&self, session: &DeviceSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO devices (user_id, device_id, ip, user_agent, last_active_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, device_id) DO UPDATE SET
                ip = excluded.ip,
                user_agent = excluded.user_agent,
                last_active_at = excluded.last_active_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&session.user_id)
        .bind(&session.device_id)
        .bind(&session.ip)
        .bind(&session.user_agent)
        .bind(session.last_active_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert device session")?;

        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<DeviceSession>> {
        let rows = sqlx::query(
            "SELECT user_id, device_id, ip, user_agent, last_active_at, expires_at \
             FROM devices WHERE user_id = ? ORDER BY last_active_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list device sessions")?;

        Ok(rows.iter().map(row_to_session).collect())
    }

    async fn get(&self, user_id: &str, device_id: &str) -> Result<Option<DeviceSession>> {
        let row = sqlx::query(
            "SELECT user_id, device_id, ip, user_agent, last_active_at, expires_at \
             FROM devices WHERE user_id = ? AND device_id = ?",
        )
        .bind(user_id)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get device session")?;

        Ok(row.as_ref().map(row_to_session))
    }

    async fn get_by_device_id(&self, device_id: &str) -> Result<Option<DeviceSession>> {
        let row = sqlx::query(
            "SELECT user_id, device_id, ip, user_agent, last_active_at, expires_at \
             FROM devices WHERE device_id = ?",
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get device session by device id")?;

        Ok(row.as_ref().map(row_to_session))
    }

    async fn delete(&self, user_id: &str, device_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM devices WHERE user_id = ? AND device_id = ?")
            .bind(user_id)
            .bind(device_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete device session")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_except(&self, user_id: &str, device_id: &str) -> Result<i64> {
        let result = sqlx::query("DELETE FROM devices WHERE user_id = ? AND device_id != ?")
            .bind(user_id)
            .bind(device_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete other device sessions")?;

        Ok(result.rows_affected() as i64)
    }

    async fn delete_expired(&self) -> Result<i64> {
        let result = sqlx::query("DELETE FROM devices WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to delete expired device sessions")?;

        Ok(result.rows_affected() as i64)
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> DeviceSession {
    DeviceSession {
        user_id: row.get("user_id"),
        device_id: row.get("device_id"),
        ip: row.get("ip"),
        user_agent: row.get("user_agent"),
        last_active_at: row.get("last_active_at"),
        expires_at: row.get("expires_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup() -> SqlxDeviceRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxDeviceRepository::new(pool)
    }

    fn session(user_id: &str, device_id: &str, minutes_left: i64) -> DeviceSession {
        let now = Utc::now();
        DeviceSession {
            user_id: user_id.into(),
            device_id: device_id.into(),
            ip: "127.0.0.1".into(),
            user_agent: "test".into(),
            last_active_at: now,
            expires_at: now + Duration::minutes(minutes_left),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let repo = setup().await;
        let mut s = session("u1", "d1", 10);
        repo.upsert(&s).await.unwrap();

        s.ip = "10.0.0.1".into();
        s.last_active_at = Utc::now() + Duration::seconds(5);
        repo.upsert(&s).await.unwrap();

        let sessions = repo.list_by_user("u1").await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].ip, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_delete_all_except_keeps_current() {
        let repo = setup().await;
        repo.upsert(&session("u1", "d1", 10)).await.unwrap();
        repo.upsert(&session("u1", "d2", 10)).await.unwrap();
        repo.upsert(&session("u1", "d3", 10)).await.unwrap();
        repo.upsert(&session("u2", "d9", 10)).await.unwrap();

        let deleted = repo.delete_all_except("u1", "d2").await.unwrap();
        assert_eq!(deleted, 2);

        let sessions = repo.list_by_user("u1").await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].device_id, "d2");

        // Other user untouched
        assert_eq!(repo.list_by_user("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_expired_sweep() {
        let repo = setup().await;
        repo.upsert(&session("u1", "live", 10)).await.unwrap();
        repo.upsert(&session("u1", "dead", -10)).await.unwrap();

        let deleted = repo.delete_expired().await.unwrap();
        assert_eq!(deleted, 1);

        let sessions = repo.list_by_user("u1").await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].device_id, "live");
    }

    #[tokio::test]
    async fn test_get_by_device_id() {
        let repo = setup().await;
        repo.upsert(&session("u1", "d1", 10)).await.unwrap();

        let found = repo.get_by_device_id("d1").await.unwrap().unwrap();
        assert_eq!(found.user_id, "u1");
        assert!(repo.get_by_device_id("missing").await.unwrap().is_none());
    }
}
