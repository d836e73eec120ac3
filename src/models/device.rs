//! Device session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A login session identified by `(user_id, device_id)`
///
/// Upserted on login and refresh; removed on logout, per-device
/// revocation or the expiration sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSession {
    /// Owning user id
    #[serde(skip_serializing)]
    pub user_id: String,
    /// Device id minted at login, preserved across refreshes
    pub device_id: String,
    /// Source address of the last login/refresh
    pub ip: String,
    /// User-agent string of the last login/refresh
    #[serde(rename = "title")]
    pub user_agent: String,
    /// When the session was last issued a token pair
    #[serde(rename = "lastActiveDate")]
    pub last_active_at: DateTime<Utc>,
    /// When the current refresh token expires
    #[serde(skip_serializing)]
    pub expires_at: DateTime<Utc>,
}

impl DeviceSession {
    /// Whether the session's refresh token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
