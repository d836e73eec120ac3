//! User account service
//!
//! Registration, email confirmation, resend, password recovery and
//! credential checking. An account moves `Unconfirmed -> Confirmed`
//! exactly once; the confirmation-code slot doubles as the recovery code,
//! and every outgoing code email is logged against the account so the
//! hourly resend ceiling can be enforced.

use anyhow::Context;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::AccountRepository;
use crate::models::{EmailConfirmation, UserAccount};
use crate::services::email::EmailService;
use crate::services::password::{hash_password, verify_password};

/// Max confirmation/recovery emails per account per hour
const EMAIL_HOURLY_CEILING: i64 = 5;

static LOGIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,10}$").expect("valid login regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Account operation errors
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Invalid input or state, reported against one request field
    #[error("{message}")]
    Field {
        field: &'static str,
        message: String,
    },

    /// Hourly per-account email ceiling reached
    #[error("too many emails sent within the last hour")]
    TooManyEmails,

    /// Unexpected failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccountError {
    fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Field {
            field,
            message: message.into(),
        }
    }
}

pub(crate) fn validate_login(login: &str) -> Result<(), AccountError> {
    if !LOGIN_RE.is_match(login) {
        return Err(AccountError::field(
            "login",
            "login must be 3-10 characters of letters, digits, '_' or '-'",
        ));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), AccountError> {
    if !EMAIL_RE.is_match(email) {
        return Err(AccountError::field("email", "invalid email format"));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.len() < 6 || password.len() > 20 {
        return Err(AccountError::field(
            "password",
            "password must be 6-20 characters",
        ));
    }
    Ok(())
}

/// Account lifecycle service
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    email: Arc<EmailService>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepository>, email: Arc<EmailService>) -> Self {
        Self { accounts, email }
    }

    /// Register a new unconfirmed account and dispatch the confirmation
    /// email. Login and email must be unused.
    pub async fn register(
        &self,
        login: &str,
        email: &str,
        password: &str,
        ip: Option<String>,
    ) -> Result<UserAccount, AccountError> {
        validate_login(login)?;
        validate_email(email)?;
        validate_password(password)?;

        if self
            .accounts
            .get_by_login(login)
            .await
            .context("Failed to check login")?
            .is_some()
        {
            return Err(AccountError::field("login", "login already exists"));
        }
        if self
            .accounts
            .get_by_email(email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(AccountError::field("email", "email already exists"));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;
        let account = UserAccount::new(login.to_string(), email.to_string(), password_hash, ip);

        let created = self
            .accounts
            .create(&account)
            .await
            .context("Failed to create account")?;

        self.accounts
            .record_email_sent(&created.id, Utc::now())
            .await
            .context("Failed to log confirmation email")?;
        self.dispatch(
            self.email
                .send_confirmation(&created.email, &created.confirmation.code)
                .await,
        );

        Ok(created)
    }

    /// Create a pre-confirmed account (admin user creation).
    pub async fn create_confirmed(
        &self,
        login: &str,
        email: &str,
        password: &str,
    ) -> Result<UserAccount, AccountError> {
        validate_login(login)?;
        validate_email(email)?;
        validate_password(password)?;

        if self
            .accounts
            .get_by_login(login)
            .await
            .context("Failed to check login")?
            .is_some()
        {
            return Err(AccountError::field("login", "login already exists"));
        }
        if self
            .accounts
            .get_by_email(email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(AccountError::field("email", "email already exists"));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;
        let mut account =
            UserAccount::new(login.to_string(), email.to_string(), password_hash, None);
        account.confirmation.is_confirmed = true;

        Ok(self
            .accounts
            .create(&account)
            .await
            .context("Failed to create account")?)
    }

    /// Confirm an account by its code.
    ///
    /// Fails when the code is unknown, expired, or already used; succeeds
    /// exactly once per account.
    pub async fn confirm_by_code(&self, code: &str) -> Result<UserAccount, AccountError> {
        let account = self
            .accounts
            .get_by_confirmation_code(code)
            .await
            .context("Failed to look up confirmation code")?
            .ok_or_else(|| {
                AccountError::field("code", "code is incorrect or account already confirmed")
            })?;

        self.confirm(account).await
    }

    /// Confirm an account by `(email, code)` pair.
    pub async fn confirm_by_email(
        &self,
        email: &str,
        code: &str,
    ) -> Result<UserAccount, AccountError> {
        let account = self
            .accounts
            .get_by_email(email)
            .await
            .context("Failed to look up email")?
            .filter(|account| account.confirmation.code == code)
            .ok_or_else(|| {
                AccountError::field("code", "code is incorrect or account already confirmed")
            })?;

        self.confirm(account).await
    }

    async fn confirm(&self, mut account: UserAccount) -> Result<UserAccount, AccountError> {
        if !account.can_confirm() {
            return Err(AccountError::field(
                "code",
                "code is incorrect, expired, or account already confirmed",
            ));
        }

        account.confirmation.is_confirmed = true;
        self.accounts
            .update_confirmation(&account.id, &account.confirmation)
            .await
            .context("Failed to confirm account")?;

        Ok(account)
    }

    /// Issue a new confirmation code and re-send the confirmation email.
    ///
    /// Rejected for unknown or already-confirmed addresses, and when the
    /// hourly email ceiling for the account is spent.
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), AccountError> {
        let account = self
            .accounts
            .get_by_email(email)
            .await
            .context("Failed to look up email")?
            .filter(|account| !account.confirmation.is_confirmed)
            .ok_or_else(|| {
                AccountError::field("email", "email unknown or already confirmed")
            })?;

        self.ensure_email_budget(&account.id).await?;

        let state = EmailConfirmation::fresh();
        self.accounts
            .update_confirmation(&account.id, &state)
            .await
            .context("Failed to store new confirmation code")?;
        self.accounts
            .record_email_sent(&account.id, Utc::now())
            .await
            .context("Failed to log confirmation email")?;
        self.dispatch(self.email.send_confirmation(email, &state.code).await);

        Ok(())
    }

    /// Start password recovery for an email address.
    ///
    /// Known addresses get a stored recovery code; unknown addresses get a
    /// decoy message so the endpoint doesn't reveal which emails exist.
    pub async fn recover_password(&self, email: &str) -> Result<(), AccountError> {
        validate_email(email)?;

        match self
            .accounts
            .get_by_email(email)
            .await
            .context("Failed to look up email")?
        {
            Some(account) => {
                self.ensure_email_budget(&account.id).await?;

                // New code, fresh deadline; confirmation status is untouched
                let state = EmailConfirmation {
                    code: Uuid::new_v4().to_string(),
                    expires_at: EmailConfirmation::fresh().expires_at,
                    is_confirmed: account.confirmation.is_confirmed,
                };
                self.accounts
                    .update_confirmation(&account.id, &state)
                    .await
                    .context("Failed to store recovery code")?;
                self.accounts
                    .record_email_sent(&account.id, Utc::now())
                    .await
                    .context("Failed to log recovery email")?;
                self.dispatch(self.email.send_recovery(email, &state.code).await);
            }
            None => {
                // Decoy: same message shape, code never stored
                let code = Uuid::new_v4().to_string();
                self.dispatch(self.email.send_recovery(email, &code).await);
            }
        }

        Ok(())
    }

    /// Set a new password for the account holding the recovery code.
    pub async fn new_password(
        &self,
        new_password: &str,
        recovery_code: &str,
    ) -> Result<(), AccountError> {
        validate_password(new_password)?;

        let account = self
            .accounts
            .get_by_confirmation_code(recovery_code)
            .await
            .context("Failed to look up recovery code")?
            .ok_or_else(|| AccountError::field("recoveryCode", "incorrect recoveryCode"))?;

        if account.confirmation.expires_at < Utc::now() {
            return Err(AccountError::field("recoveryCode", "recoveryCode expired"));
        }

        let password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.accounts
            .update_password_hash(&account.id, &password_hash)
            .await
            .context("Failed to update password")?;

        // Recovery codes are one-time: rotate the slot
        let state = EmailConfirmation {
            code: Uuid::new_v4().to_string(),
            expires_at: account.confirmation.expires_at,
            is_confirmed: account.confirmation.is_confirmed,
        };
        self.accounts
            .update_confirmation(&account.id, &state)
            .await
            .context("Failed to rotate recovery code")?;

        Ok(())
    }

    /// Check login-or-email plus password; `None` on any mismatch.
    ///
    /// Only confirmed accounts can authenticate.
    pub async fn check_credentials(
        &self,
        login_or_email: &str,
        password: &str,
    ) -> Result<Option<UserAccount>, AccountError> {
        let account = match self
            .accounts
            .get_by_login(login_or_email)
            .await
            .context("Failed to look up login")?
        {
            Some(account) => Some(account),
            None => self
                .accounts
                .get_by_email(login_or_email)
                .await
                .context("Failed to look up email")?,
        };

        let Some(account) = account else {
            return Ok(None);
        };
        if !account.confirmation.is_confirmed {
            return Ok(None);
        }

        let valid = verify_password(password, &account.password_hash)
            .context("Failed to verify password")?;
        Ok(valid.then_some(account))
    }

    /// Get an account by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserAccount>, AccountError> {
        Ok(self
            .accounts
            .get_by_id(id)
            .await
            .context("Failed to get account")?)
    }

    async fn ensure_email_budget(&self, account_id: &str) -> Result<(), AccountError> {
        let sent = self
            .accounts
            .count_emails_sent_since(account_id, Utc::now() - Duration::hours(1))
            .await
            .context("Failed to count sent emails")?;
        if sent >= EMAIL_HOURLY_CEILING {
            return Err(AccountError::TooManyEmails);
        }
        Ok(())
    }

    /// Delivery failures are logged, never retried, never surfaced.
    fn dispatch(&self, outcome: anyhow::Result<()>) {
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "email delivery failed");
        }
    }
}
