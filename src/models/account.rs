//! User account model
//!
//! A user account carries its email-confirmation state: an account starts
//! unconfirmed with a one-time code and a deadline, and flips to confirmed
//! exactly once. The same code slot is reused for password recovery.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long a confirmation or recovery code stays valid
const CODE_TTL_MINUTES: i64 = 65;

/// Registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Opaque unique identifier
    pub id: String,
    /// Login name (unique)
    pub login: String,
    /// Email address (unique)
    pub email: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Email-confirmation state
    #[serde(skip_serializing)]
    pub confirmation: EmailConfirmation,
    /// Source address recorded at registration
    #[serde(skip_serializing)]
    pub registration_ip: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Email-confirmation state embedded in an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfirmation {
    /// One-time code proving email ownership
    pub code: String,
    /// Deadline after which the code no longer confirms
    pub expires_at: DateTime<Utc>,
    /// Whether the email has been confirmed
    pub is_confirmed: bool,
}

impl UserAccount {
    /// Create a new unconfirmed account with a fresh confirmation code.
    ///
    /// The password must already be hashed; see `services::password`.
    pub fn new(
        login: String,
        email: String,
        password_hash: String,
        registration_ip: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            login,
            email,
            password_hash,
            confirmation: EmailConfirmation::fresh(),
            registration_ip,
            created_at: Utc::now(),
        }
    }

    /// Whether the current code can still confirm this account
    pub fn can_confirm(&self) -> bool {
        !self.confirmation.is_confirmed && self.confirmation.expires_at > Utc::now()
    }
}

impl EmailConfirmation {
    /// A fresh unconfirmed state with a new code and deadline
    pub fn fresh() -> Self {
        Self {
            code: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + Duration::minutes(CODE_TTL_MINUTES),
            is_confirmed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> UserAccount {
        UserAccount::new(
            "bob".into(),
            "bob@example.com".into(),
            "$argon2id$hash".into(),
            Some("127.0.0.1".into()),
        )
    }

    #[test]
    fn test_new_account_is_unconfirmed() {
        let account = account();
        assert!(!account.confirmation.is_confirmed);
        assert!(account.can_confirm());
        assert!(!account.confirmation.code.is_empty());
    }

    #[test]
    fn test_expired_code_cannot_confirm() {
        let mut account = account();
        account.confirmation.expires_at = Utc::now() - Duration::minutes(1);
        assert!(!account.can_confirm());
    }

    #[test]
    fn test_confirmed_account_cannot_reconfirm() {
        let mut account = account();
        account.confirmation.is_confirmed = true;
        assert!(!account.can_confirm());
    }

    #[test]
    fn test_fresh_codes_are_unique() {
        assert_ne!(EmailConfirmation::fresh().code, EmailConfirmation::fresh().code);
    }

    #[test]
    fn test_sensitive_fields_not_serialized() {
        let account = account();
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("confirmation").is_none());
        assert!(json.get("login").is_some());
    }
}
