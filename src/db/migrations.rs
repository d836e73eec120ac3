//! Database migrations module
//!
//! Code-based migrations for the inkpress API. All migrations are embedded
//! directly in Rust code as SQL strings for single-binary deployment.
//!
//! Each migration is a `Migration` struct containing:
//! - `version`: Unique version number for ordering
//! - `name`: Human-readable migration name
//! - `up`: SQL statements applied when the migration runs

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements to apply
    pub up: &'static str,
}

/// All migrations for the inkpress API.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: user accounts with embedded email-confirmation state
    Migration {
        version: 1,
        name: "create_user_accounts",
        up: r#"
            CREATE TABLE IF NOT EXISTS user_accounts (
                id VARCHAR(36) PRIMARY KEY,
                login VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                confirmation_code VARCHAR(36) NOT NULL,
                confirmation_expires_at TIMESTAMP NOT NULL,
                is_confirmed INTEGER NOT NULL DEFAULT 0,
                registration_ip VARCHAR(64),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_accounts_login ON user_accounts(login);
            CREATE INDEX IF NOT EXISTS idx_accounts_email ON user_accounts(email);
            CREATE INDEX IF NOT EXISTS idx_accounts_code ON user_accounts(confirmation_code);
        "#,
    },
    // Migration 2: confirmation/recovery send log (per-account resend ceiling)
    Migration {
        version: 2,
        name: "create_sent_email_log",
        up: r#"
            CREATE TABLE IF NOT EXISTS sent_email_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id VARCHAR(36) NOT NULL,
                sent_at TIMESTAMP NOT NULL,
                FOREIGN KEY (account_id) REFERENCES user_accounts(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sent_email_account ON sent_email_log(account_id, sent_at);
        "#,
    },
    // Migration 3: blogs
    Migration {
        version: 3,
        name: "create_blogs",
        up: r#"
            CREATE TABLE IF NOT EXISTS blogs (
                id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                website_url VARCHAR(200) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_blogs_name ON blogs(name);
        "#,
    },
    // Migration 4: posts (blog back-reference is denormalized into blog_name,
    // mirroring the wire shape)
    Migration {
        version: 4,
        name: "create_posts",
        up: r#"
            CREATE TABLE IF NOT EXISTS posts (
                id VARCHAR(36) PRIMARY KEY,
                title VARCHAR(100) NOT NULL,
                short_description VARCHAR(200) NOT NULL,
                content TEXT NOT NULL,
                blog_id VARCHAR(36) NOT NULL,
                blog_name VARCHAR(100) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (blog_id) REFERENCES blogs(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_posts_blog_id ON posts(blog_id);
        "#,
    },
    // Migration 5: comments
    Migration {
        version: 5,
        name: "create_comments",
        up: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id VARCHAR(36) PRIMARY KEY,
                content TEXT NOT NULL,
                user_id VARCHAR(36) NOT NULL,
                user_login VARCHAR(50) NOT NULL,
                post_id VARCHAR(36) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id);
        "#,
    },
    // Migration 6: device sessions, one row per (user_id, device_id)
    Migration {
        version: 6,
        name: "create_devices",
        up: r#"
            CREATE TABLE IF NOT EXISTS devices (
                user_id VARCHAR(36) NOT NULL,
                device_id VARCHAR(36) NOT NULL,
                ip VARCHAR(64) NOT NULL,
                user_agent VARCHAR(255) NOT NULL,
                last_active_at TIMESTAMP NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                PRIMARY KEY (user_id, device_id)
            );
            CREATE INDEX IF NOT EXISTS idx_devices_expires_at ON devices(expires_at);
        "#,
    },
    // Migration 7: consumed refresh tokens
    Migration {
        version: 7,
        name: "create_refresh_token_blacklist",
        up: r#"
            CREATE TABLE IF NOT EXISTS refresh_token_blacklist (
                token TEXT PRIMARY KEY,
                user_id VARCHAR(36) NOT NULL,
                expires_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_blacklist_expires_at ON refresh_token_blacklist(expires_at);
        "#,
    },
    // Migration 8: rate-limit request log
    Migration {
        version: 8,
        name: "create_rate_limit_log",
        up: r#"
            CREATE TABLE IF NOT EXISTS rate_limit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ip VARCHAR(64) NOT NULL,
                category VARCHAR(32) NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_rate_limit_ip_category ON rate_limit_log(ip, category, created_at);
        "#,
    },
];

/// Run all pending migrations against the pool.
///
/// Creates the `schema_migrations` bookkeeping table on first run; applies
/// migrations in version order, skipping ones already recorded.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(100) NOT NULL,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create schema_migrations table")?;

    for migration in MIGRATIONS {
        let applied: Option<i64> =
            sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?")
                .bind(migration.version)
                .fetch_optional(pool)
                .await
                .context("Failed to query schema_migrations")?;

        if applied.is_some() {
            continue;
        }

        // SQLite executes one statement per call, so split the block
        for statement in migration
            .up
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| {
                    format!(
                        "Failed to apply migration {} ({})",
                        migration.version, migration.name
                    )
                })?;
        }

        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(pool)
            .await
            .context("Failed to record migration")?;

        tracing::debug!(version = migration.version, name = migration.name, "applied migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_migrations_run_cleanly() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");

        // All tables exist
        for table in [
            "user_accounts",
            "sent_email_log",
            "blogs",
            "posts",
            "comments",
            "devices",
            "refresh_token_blacklist",
            "rate_limit_log",
        ] {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .expect("Failed to query sqlite_master");
            assert_eq!(count, 1, "table {} missing", table);
        }
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("First run failed");
        run_migrations(&pool).await.expect("Second run failed");

        let row = sqlx::query("SELECT COUNT(*) as count FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .expect("Failed to count migrations");
        let count: i64 = row.get("count");
        assert_eq!(count, MIGRATIONS.len() as i64);
    }
}
