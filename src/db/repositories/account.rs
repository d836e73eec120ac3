//! User account repository
//!
//! Database operations for user accounts and their email-confirmation
//! state, plus the per-account sent-email log used for the resend ceiling.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{EmailConfirmation, PageRequest, Paginated, UserAccount};

/// User account repository trait
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create a new account
    async fn create(&self, account: &UserAccount) -> Result<UserAccount>;

    /// Get an account by id
    async fn get_by_id(&self, id: &str) -> Result<Option<UserAccount>>;

    /// Get an account by login
    async fn get_by_login(&self, login: &str) -> Result<Option<UserAccount>>;

    /// Get an account by email
    async fn get_by_email(&self, email: &str) -> Result<Option<UserAccount>>;

    /// Get an account by its current confirmation/recovery code
    async fn get_by_confirmation_code(&self, code: &str) -> Result<Option<UserAccount>>;

    /// List accounts with pagination and optional login/email substrings
    async fn list(
        &self,
        page: &PageRequest,
        search_login: Option<&str>,
        search_email: Option<&str>,
    ) -> Result<Paginated<UserAccount>>;

    /// Replace the confirmation state; false when the account is absent
    async fn update_confirmation(&self, id: &str, state: &EmailConfirmation) -> Result<bool>;

    /// Replace the password hash; false when the account is absent
    async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<bool>;

    /// Delete an account; false when already absent
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Record that a confirmation/recovery email went out for the account
    async fn record_email_sent(&self, account_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Count emails sent for the account since the given instant
    async fn count_emails_sent_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64>;
}

/// SQLx-based account repository implementation
pub struct SqlxAccountRepository {
    pool: SqlitePool,
}

impl SqlxAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn AccountRepository> {
        Arc::new(Self::new(pool))
    }

    async fn get_where(&self, clause: &str, value: &str) -> Result<Option<UserAccount>> {
        let query = format!(
            "SELECT id, login, email, password_hash, confirmation_code, \
             confirmation_expires_at, is_confirmed, registration_ip, created_at \
             FROM user_accounts WHERE {} = ?",
            clause
        );
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to get account by {}", clause))?;

        Ok(row.as_ref().map(row_to_account))
    }
}

/// Whitelist of sortable columns; anything else falls back to created_at
fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("login") => "login",
        Some("email") => "email",
        _ => "created_at",
    }
}

#[async_trait]
impl AccountRepository for SqlxAccountRepository {
    async fn create(&self, account: &UserAccount) -> Result<UserAccount> {
        sqlx::query(
            r#"
            INSERT INTO user_accounts
                (id, login, email, password_hash, confirmation_code,
                 confirmation_expires_at, is_confirmed, registration_ip, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.login)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.confirmation.code)
        .bind(account.confirmation.expires_at)
        .bind(account.confirmation.is_confirmed)
        .bind(&account.registration_ip)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create account")?;

        Ok(account.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<UserAccount>> {
        self.get_where("id", id).await
    }

    async fn get_by_login(&self, login: &str) -> Result<Option<UserAccount>> {
        self.get_where("login", login).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        self.get_where("email", email).await
    }

    async fn get_by_confirmation_code(&self, code: &str) -> Result<Option<UserAccount>> {
        self.get_where("confirmation_code", code).await
    }

    async fn list(
        &self,
        page: &PageRequest,
        search_login: Option<&str>,
        search_email: Option<&str>,
    ) -> Result<Paginated<UserAccount>> {
        let column = sort_column(page.sort_by.as_deref());
        let direction = page.sort_direction.as_sql();

        // Present terms match either way, as on the wire: login OR email;
        // an absent term must not widen the filter
        let login_pattern = search_login.map(|term| format!("%{}%", term));
        let email_pattern = search_email.map(|term| format!("%{}%", term));
        let where_clause = match (&login_pattern, &email_pattern) {
            (Some(_), Some(_)) => "WHERE (login LIKE ? OR email LIKE ?)",
            (Some(_), None) => "WHERE login LIKE ?",
            (None, Some(_)) => "WHERE email LIKE ?",
            (None, None) => "",
        };

        let query = format!(
            "SELECT id, login, email, password_hash, confirmation_code, \
             confirmation_expires_at, is_confirmed, registration_ip, created_at \
             FROM user_accounts {} ORDER BY {} {} LIMIT ? OFFSET ?",
            where_clause, column, direction
        );
        let mut list_query = sqlx::query(&query);
        for pattern in [&login_pattern, &email_pattern].into_iter().flatten() {
            list_query = list_query.bind(pattern);
        }
        let rows = list_query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        let count_sql = format!("SELECT COUNT(*) FROM user_accounts {}", where_clause);
        let mut count_query = sqlx::query_scalar(&count_sql);
        for pattern in [&login_pattern, &email_pattern].into_iter().flatten() {
            count_query = count_query.bind(pattern);
        }
        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count accounts")?;

        let accounts = rows.iter().map(row_to_account).collect();
        Ok(Paginated::new(accounts, total, page))
    }

    async fn update_confirmation(&self, id: &str, state: &EmailConfirmation) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE user_accounts SET confirmation_code = ?, \
             confirmation_expires_at = ?, is_confirmed = ? WHERE id = ?",
        )
        .bind(&state.code)
        .bind(state.expires_at)
        .bind(state.is_confirmed)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update confirmation state")?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE user_accounts SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update password hash")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete account")?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_email_sent(&self, account_id: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT INTO sent_email_log (account_id, sent_at) VALUES (?, ?)")
            .bind(account_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .context("Failed to record sent email")?;

        Ok(())
    }

    async fn count_emails_sent_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sent_email_log WHERE account_id = ? AND sent_at > ?",
        )
        .bind(account_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count sent emails")?;

        Ok(count)
    }
}

fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> UserAccount {
    UserAccount {
        id: row.get("id"),
        login: row.get("login"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        confirmation: EmailConfirmation {
            code: row.get("confirmation_code"),
            expires_at: row.get("confirmation_expires_at"),
            is_confirmed: row.get("is_confirmed"),
        },
        registration_ip: row.get("registration_ip"),
        created_at: row.get("created_at"),
    }
}
