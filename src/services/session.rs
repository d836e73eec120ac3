//! Session lifecycle service
//!
//! Owns the refresh-token state machine: login mints an access/refresh
//! pair under a fresh device id, rotation consumes the old refresh token
//! (blacklisting it) and mints a new pair preserving the device id, and
//! logout consumes the token and drops the device session.
//!
//! The blacklist check and the signature check are both mandatory: a
//! syntactically valid but already-consumed token is rejected.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::{BlacklistRepository, DeviceRepository};
use crate::models::DeviceSession;
use crate::services::jwt::{Claims, JwtService, TokenKind};

/// Session operation errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Token missing, expired, mis-signed or blacklisted
    #[error("refresh token rejected")]
    Unauthorized,

    /// Device belongs to another user
    #[error("device owned by another account")]
    Forbidden,

    /// Device session not found
    #[error("device not found")]
    DeviceNotFound,

    /// Unexpected failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A freshly minted token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Claims of the refresh token; drive the device session row
    pub refresh_claims: Claims,
}

/// Auth/session subsystem
pub struct SessionService {
    jwt: Arc<JwtService>,
    devices: Arc<dyn DeviceRepository>,
    blacklist: Arc<dyn BlacklistRepository>,
}

impl SessionService {
    pub fn new(
        jwt: Arc<JwtService>,
        devices: Arc<dyn DeviceRepository>,
        blacklist: Arc<dyn BlacklistRepository>,
    ) -> Self {
        Self {
            jwt,
            devices,
            blacklist,
        }
    }

    /// Mint a token pair for a fresh device session and record it.
    pub async fn login(
        &self,
        user_id: &str,
        ip: &str,
        user_agent: &str,
    ) -> Result<TokenPair, SessionError> {
        let device_id = Uuid::new_v4().to_string();
        let pair = self.issue_pair(user_id, &device_id)?;
        self.upsert_device(&pair.refresh_claims, ip, user_agent).await?;
        Ok(pair)
    }

    /// Validate a refresh token: well-signed, unexpired, not blacklisted.
    pub async fn authenticate_refresh(&self, token: &str) -> Result<Claims, SessionError> {
        if self.blacklist.contains(token).await? {
            return Err(SessionError::Unauthorized);
        }
        self.jwt
            .verify(TokenKind::Refresh, token)
            .ok_or(SessionError::Unauthorized)
    }

    /// Consume a refresh token and mint a new pair preserving the device id.
    pub async fn rotate(
        &self,
        old_token: &str,
        ip: &str,
        user_agent: &str,
    ) -> Result<TokenPair, SessionError> {
        let claims = self.authenticate_refresh(old_token).await?;

        // One-time use: the consumed token can never authenticate again
        self.blacklist
            .insert(old_token, &claims.user_id, claims.expires_at())
            .await?;

        let pair = self.issue_pair(&claims.user_id, &claims.device_id)?;
        self.upsert_device(&pair.refresh_claims, ip, user_agent).await?;
        Ok(pair)
    }

    /// Consume a refresh token and drop its device session.
    pub async fn logout(&self, token: &str) -> Result<(), SessionError> {
        let claims = self.authenticate_refresh(token).await?;

        self.blacklist
            .insert(token, &claims.user_id, claims.expires_at())
            .await?;
        self.devices.delete(&claims.user_id, &claims.device_id).await?;
        Ok(())
    }

    /// Active device sessions for the token's user.
    pub async fn list_devices(&self, token: &str) -> Result<Vec<DeviceSession>, SessionError> {
        let claims = self.authenticate_refresh(token).await?;
        Ok(self.devices.list_by_user(&claims.user_id).await?)
    }

    /// Drop every session of the token's user except the current device.
    pub async fn revoke_other_devices(&self, token: &str) -> Result<(), SessionError> {
        let claims = self.authenticate_refresh(token).await?;
        self.devices
            .delete_all_except(&claims.user_id, &claims.device_id)
            .await?;
        Ok(())
    }

    /// Drop one device session of the token's user.
    ///
    /// A device id belonging to another account yields `Forbidden`; an
    /// unknown device id yields `DeviceNotFound`.
    pub async fn revoke_device(&self, token: &str, device_id: &str) -> Result<(), SessionError> {
        let claims = self.authenticate_refresh(token).await?;

        let session = self
            .devices
            .get_by_device_id(device_id)
            .await?
            .ok_or(SessionError::DeviceNotFound)?;

        if session.user_id != claims.user_id {
            return Err(SessionError::Forbidden);
        }

        self.devices.delete(&claims.user_id, device_id).await?;
        Ok(())
    }

    fn issue_pair(&self, user_id: &str, device_id: &str) -> Result<TokenPair, SessionError> {
        let (access_token, _) = self
            .jwt
            .issue(TokenKind::Access, user_id, device_id)
            .map_err(SessionError::Internal)?;
        let (refresh_token, refresh_claims) = self
            .jwt
            .issue(TokenKind::Refresh, user_id, device_id)
            .map_err(SessionError::Internal)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_claims,
        })
    }

    async fn upsert_device(
        &self,
        claims: &Claims,
        ip: &str,
        user_agent: &str,
    ) -> Result<(), SessionError> {
        self.devices
            .upsert(&DeviceSession {
                user_id: claims.user_id.clone(),
                device_id: claims.device_id.clone(),
                ip: ip.to_string(),
                user_agent: user_agent.to_string(),
                last_active_at: claims.issued_at(),
                expires_at: claims.expires_at(),
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::db::repositories::{SqlxBlacklistRepository, SqlxDeviceRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SessionService {
        setup_with_ttl(600).await
    }

    async fn setup_with_ttl(refresh_ttl_secs: i64) -> SessionService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let jwt = Arc::new(JwtService::new(&AuthConfig {
            access_secret: "test-access".into(),
            refresh_secret: "test-refresh".into(),
            access_ttl_secs: 300,
            refresh_ttl_secs,
            ..AuthConfig::default()
        }));
        SessionService::new(
            jwt,
            SqlxDeviceRepository::boxed(pool.clone()),
            SqlxBlacklistRepository::boxed(pool),
        )
    }

    #[tokio::test]
    async fn test_login_records_device_session() {
        let sessions = setup().await;
        let pair = sessions.login("u1", "127.0.0.1", "test agent").await.unwrap();

        let devices = sessions.list_devices(&pair.refresh_token).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device_id, pair.refresh_claims.device_id);
        assert_eq!(devices[0].ip, "127.0.0.1");
        assert_eq!(devices[0].user_agent, "test agent");
    }

    #[tokio::test]
    async fn test_rotation_preserves_device_id() {
        let sessions = setup().await;
        let pair = sessions.login("u1", "127.0.0.1", "a").await.unwrap();

        let rotated = sessions
            .rotate(&pair.refresh_token, "10.0.0.1", "b")
            .await
            .unwrap();

        assert_eq!(
            rotated.refresh_claims.device_id,
            pair.refresh_claims.device_id
        );

        // Still exactly one device row, refreshed in place
        let devices = sessions.list_devices(&rotated.refresh_token).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_consumed_token_is_permanently_rejected() {
        let sessions = setup().await;
        let pair = sessions.login("u1", "127.0.0.1", "a").await.unwrap();

        sessions
            .rotate(&pair.refresh_token, "127.0.0.1", "a")
            .await
            .unwrap();

        // The old token can neither rotate nor logout
        assert!(matches!(
            sessions.rotate(&pair.refresh_token, "127.0.0.1", "a").await,
            Err(SessionError::Unauthorized)
        ));
        assert!(matches!(
            sessions.logout(&pair.refresh_token).await,
            Err(SessionError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_logout_blacklists_and_drops_device() {
        let sessions = setup().await;
        let pair = sessions.login("u1", "127.0.0.1", "a").await.unwrap();
        let second = sessions.login("u1", "127.0.0.1", "b").await.unwrap();

        sessions.logout(&pair.refresh_token).await.unwrap();

        assert!(matches!(
            sessions.logout(&pair.refresh_token).await,
            Err(SessionError::Unauthorized)
        ));

        // The other session survives
        let devices = sessions.list_devices(&second.refresh_token).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device_id, second.refresh_claims.device_id);
    }

    #[tokio::test]
    async fn test_expired_refresh_token_is_rejected() {
        let sessions = setup_with_ttl(-10).await;
        let pair = sessions.login("u1", "127.0.0.1", "a").await.unwrap();

        assert!(matches!(
            sessions.authenticate_refresh(&pair.refresh_token).await,
            Err(SessionError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let sessions = setup().await;
        assert!(matches!(
            sessions.authenticate_refresh("junk").await,
            Err(SessionError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_revoke_other_devices_keeps_current() {
        let sessions = setup().await;
        let first = sessions.login("u1", "127.0.0.1", "a").await.unwrap();
        sessions.login("u1", "127.0.0.1", "b").await.unwrap();
        sessions.login("u1", "127.0.0.1", "c").await.unwrap();

        sessions.revoke_other_devices(&first.refresh_token).await.unwrap();

        let devices = sessions.list_devices(&first.refresh_token).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device_id, first.refresh_claims.device_id);
    }

    #[tokio::test]
    async fn test_revoke_device_ownership_rules() {
        let sessions = setup().await;
        let mine = sessions.login("u1", "127.0.0.1", "a").await.unwrap();
        let theirs = sessions.login("u2", "127.0.0.1", "b").await.unwrap();

        // Unknown device
        assert!(matches!(
            sessions.revoke_device(&mine.refresh_token, "missing").await,
            Err(SessionError::DeviceNotFound)
        ));

        // Someone else's device
        assert!(matches!(
            sessions
                .revoke_device(&mine.refresh_token, &theirs.refresh_claims.device_id)
                .await,
            Err(SessionError::Forbidden)
        ));

        // Own device
        sessions
            .revoke_device(&mine.refresh_token, &mine.refresh_claims.device_id)
            .await
            .unwrap();
    }
}
