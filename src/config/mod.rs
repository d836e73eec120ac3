//! Configuration management
//!
//! This module handles loading and parsing configuration for the inkpress API.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::models::RouteCategory;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token and credential configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Background cleanup configuration
    #[serde(default)]
    pub cleanup: CleanupConfig,
    /// Outgoing email configuration
    #[serde(default)]
    pub email: EmailConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/inkpress.db".to_string()
}

/// Token signing and admin credential configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    #[serde(default = "default_access_secret")]
    pub access_secret: String,
    /// HMAC secret for refresh tokens (must differ from the access secret)
    #[serde(default = "default_refresh_secret")]
    pub refresh_secret: String,
    /// Access token lifetime in seconds
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: i64,
    /// Username for the Basic-auth admin surface
    #[serde(default = "default_basic_user")]
    pub basic_user: String,
    /// Password for the Basic-auth admin surface
    #[serde(default = "default_basic_password")]
    pub basic_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: default_access_secret(),
            refresh_secret: default_refresh_secret(),
            access_ttl_secs: default_access_ttl(),
            refresh_ttl_secs: default_refresh_ttl(),
            basic_user: default_basic_user(),
            basic_password: default_basic_password(),
        }
    }
}

fn default_access_secret() -> String {
    "dev-access-secret-change-in-production".to_string()
}

fn default_refresh_secret() -> String {
    "dev-refresh-secret-change-in-production".to_string()
}

fn default_access_ttl() -> i64 {
    300
}

fn default_refresh_ttl() -> i64 {
    600
}

fn default_basic_user() -> String {
    "admin".to_string()
}

fn default_basic_password() -> String {
    "qwerty".to_string()
}

/// Rate limiting configuration
///
/// The trailing window and the sweep cadence are deliberately independent
/// knobs; ceilings are per route category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Trailing window in seconds over which requests are counted
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
    /// How often the sweep task deletes entries older than the window
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Max login attempts per IP per window
    #[serde(default = "default_category_max")]
    pub login_max: i64,
    /// Max registration requests per IP per window
    #[serde(default = "default_category_max")]
    pub registration_max: i64,
    /// Max confirmation attempts per IP per window
    #[serde(default = "default_category_max")]
    pub confirmation_max: i64,
    /// Max email-resend requests per IP per window
    #[serde(default = "default_category_max")]
    pub email_resend_max: i64,
    /// Max password-recovery requests per IP per window
    #[serde(default = "default_category_max")]
    pub password_recovery_max: i64,
    /// Max new-password requests per IP per window
    #[serde(default = "default_category_max")]
    pub new_password_max: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            login_max: default_category_max(),
            registration_max: default_category_max(),
            confirmation_max: default_category_max(),
            email_resend_max: default_category_max(),
            password_recovery_max: default_category_max(),
            new_password_max: default_category_max(),
        }
    }
}

impl RateLimitConfig {
    /// Ceiling for a route category
    pub fn ceiling(&self, category: RouteCategory) -> i64 {
        match category {
            RouteCategory::Login => self.login_max,
            RouteCategory::Registration => self.registration_max,
            RouteCategory::Confirmation => self.confirmation_max,
            RouteCategory::EmailResend => self.email_resend_max,
            RouteCategory::PasswordRecovery => self.password_recovery_max,
            RouteCategory::NewPassword => self.new_password_max,
        }
    }
}

fn default_window_secs() -> i64 {
    10
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_category_max() -> i64 {
    5
}

/// Background cleanup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// How often expired device sessions are deleted
    #[serde(default = "default_device_sweep_secs")]
    pub device_sweep_secs: u64,
    /// How often expired blacklist entries are deleted
    #[serde(default = "default_blacklist_sweep_secs")]
    pub blacklist_sweep_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            device_sweep_secs: default_device_sweep_secs(),
            blacklist_sweep_secs: default_blacklist_sweep_secs(),
        }
    }
}

fn default_device_sweep_secs() -> u64 {
    60
}

fn default_blacklist_sweep_secs() -> u64 {
    600
}

/// Outgoing email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host; empty disables sending
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username
    #[serde(default)]
    pub username: String,
    /// SMTP password
    #[serde(default)]
    pub password: String,
    /// From address for outgoing mail
    #[serde(default = "default_email_from")]
    pub from: String,
    /// Public base URL used to build confirmation/recovery links
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: default_email_from(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_email_from() -> String {
    "inkpress <no-reply@inkpress.local>".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern `INKPRESS_<SECTION>_<FIELD>`,
    /// e.g. `INKPRESS_SERVER_PORT` or `INKPRESS_AUTH_ACCESS_SECRET`.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("INKPRESS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("INKPRESS_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("INKPRESS_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(url) = std::env::var("INKPRESS_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(secret) = std::env::var("INKPRESS_AUTH_ACCESS_SECRET") {
            self.auth.access_secret = secret;
        }
        if let Ok(secret) = std::env::var("INKPRESS_AUTH_REFRESH_SECRET") {
            self.auth.refresh_secret = secret;
        }
        if let Ok(ttl) = std::env::var("INKPRESS_AUTH_ACCESS_TTL_SECS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                self.auth.access_ttl_secs = ttl;
            }
        }
        if let Ok(ttl) = std::env::var("INKPRESS_AUTH_REFRESH_TTL_SECS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                self.auth.refresh_ttl_secs = ttl;
            }
        }
        if let Ok(user) = std::env::var("INKPRESS_AUTH_BASIC_USER") {
            self.auth.basic_user = user;
        }
        if let Ok(password) = std::env::var("INKPRESS_AUTH_BASIC_PASSWORD") {
            self.auth.basic_password = password;
        }

        if let Ok(window) = std::env::var("INKPRESS_RATE_LIMIT_WINDOW_SECS") {
            if let Ok(window) = window.parse::<i64>() {
                self.rate_limit.window_secs = window;
            }
        }
        if let Ok(interval) = std::env::var("INKPRESS_RATE_LIMIT_SWEEP_INTERVAL_SECS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.rate_limit.sweep_interval_secs = interval;
            }
        }

        if let Ok(interval) = std::env::var("INKPRESS_CLEANUP_DEVICE_SWEEP_SECS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.cleanup.device_sweep_secs = interval;
            }
        }
        if let Ok(interval) = std::env::var("INKPRESS_CLEANUP_BLACKLIST_SWEEP_SECS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.cleanup.blacklist_sweep_secs = interval;
            }
        }

        if let Ok(host) = std::env::var("INKPRESS_EMAIL_SMTP_HOST") {
            self.email.smtp_host = host;
        }
        if let Ok(port) = std::env::var("INKPRESS_EMAIL_SMTP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.email.smtp_port = port;
            }
        }
        if let Ok(username) = std::env::var("INKPRESS_EMAIL_USERNAME") {
            self.email.username = username;
        }
        if let Ok(password) = std::env::var("INKPRESS_EMAIL_PASSWORD") {
            self.email.password = password;
        }
        if let Ok(from) = std::env::var("INKPRESS_EMAIL_FROM") {
            self.email.from = from;
        }
        if let Ok(url) = std::env::var("INKPRESS_EMAIL_PUBLIC_BASE_URL") {
            self.email.public_base_url = url;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn clear_env() {
        for key in [
            "INKPRESS_SERVER_HOST",
            "INKPRESS_SERVER_PORT",
            "INKPRESS_SERVER_CORS_ORIGIN",
            "INKPRESS_DATABASE_URL",
            "INKPRESS_AUTH_ACCESS_SECRET",
            "INKPRESS_AUTH_REFRESH_SECRET",
            "INKPRESS_AUTH_ACCESS_TTL_SECS",
            "INKPRESS_AUTH_REFRESH_TTL_SECS",
            "INKPRESS_AUTH_BASIC_USER",
            "INKPRESS_AUTH_BASIC_PASSWORD",
            "INKPRESS_RATE_LIMIT_WINDOW_SECS",
            "INKPRESS_RATE_LIMIT_SWEEP_INTERVAL_SECS",
            "INKPRESS_CLEANUP_DEVICE_SWEEP_SECS",
            "INKPRESS_CLEANUP_BLACKLIST_SWEEP_SECS",
            "INKPRESS_EMAIL_SMTP_HOST",
            "INKPRESS_EMAIL_SMTP_PORT",
            "INKPRESS_EMAIL_USERNAME",
            "INKPRESS_EMAIL_PASSWORD",
            "INKPRESS_EMAIL_FROM",
            "INKPRESS_EMAIL_PUBLIC_BASE_URL",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "data/inkpress.db");
        assert_eq!(config.auth.access_ttl_secs, 300);
        assert_eq!(config.auth.refresh_ttl_secs, 600);
        assert_eq!(config.rate_limit.window_secs, 10);
        assert_eq!(config.rate_limit.sweep_interval_secs, 60);
        assert_eq!(config.cleanup.device_sweep_secs, 60);
        assert_eq!(config.email.smtp_port, 587);
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rate_limit.login_max, 5);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 3000\nrate_limit:\n  login_max: 7\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.rate_limit.login_max, 7);
        // Defaults fill the rest
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.rate_limit.registration_max, 5);
        assert_eq!(config.auth.access_ttl_secs, 300);
    }

    #[test]
    fn test_load_full_auth_section() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
auth:
  access_secret: "a-secret"
  refresh_secret: "r-secret"
  access_ttl_secs: 60
  refresh_ttl_secs: 120
  basic_user: "root"
  basic_password: "hunter2"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.auth.access_secret, "a-secret");
        assert_eq!(config.auth.refresh_secret, "r-secret");
        assert_eq!(config.auth.access_ttl_secs, 60);
        assert_eq!(config.auth.refresh_ttl_secs, 120);
        assert_eq!(config.auth.basic_user, "root");
        assert_eq!(config.auth.basic_password, "hunter2");
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let result = Config::load(file.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_ceiling_per_category() {
        let mut config = RateLimitConfig::default();
        config.login_max = 3;
        config.email_resend_max = 9;

        assert_eq!(config.ceiling(RouteCategory::Login), 3);
        assert_eq!(config.ceiling(RouteCategory::EmailResend), 9);
        assert_eq!(config.ceiling(RouteCategory::Registration), 5);
    }

    #[test]
    fn test_env_override_server_and_auth() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("INKPRESS_SERVER_PORT", "4000");
        std::env::set_var("INKPRESS_AUTH_ACCESS_SECRET", "env-secret");
        std::env::set_var("INKPRESS_AUTH_ACCESS_TTL_SECS", "42");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.access_secret, "env-secret");
        assert_eq!(config.auth.access_ttl_secs, 42);

        clear_env();
    }

    #[test]
    fn test_env_override_invalid_port_ignored() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8081\n").unwrap();

        std::env::set_var("INKPRESS_SERVER_PORT", "not_a_number");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 8081);

        clear_env();
    }

    #[test]
    fn test_env_override_rate_limit_knobs_are_independent() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        std::env::set_var("INKPRESS_RATE_LIMIT_WINDOW_SECS", "15");
        std::env::set_var("INKPRESS_RATE_LIMIT_SWEEP_INTERVAL_SECS", "600");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.rate_limit.window_secs, 15);
        assert_eq!(config.rate_limit.sweep_interval_secs, 600);

        clear_env();
    }
}
