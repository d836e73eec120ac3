//! JWT token issuance and validation
//!
//! Access and refresh tokens share one payload shape but are signed with
//! distinct secrets and lifetimes. Verification fails closed: expired,
//! malformed or mis-signed tokens yield `None`, never an error. Leeway is
//! zero because the lifetimes are seconds-scale.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

/// Claims carried by both token kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id the token authenticates
    pub user_id: String,
    /// Device session the token belongs to
    pub device_id: String,
    /// Unique token id; `iat`/`exp` are second-granularity, so without it
    /// a pair minted within one second would be byte-identical and a
    /// rotated token could collide with its blacklisted predecessor
    pub jti: String,
    /// Issued-at timestamp (Unix epoch seconds)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,
}

impl Claims {
    /// Expiration as a UTC timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }

    /// Issued-at as a UTC timestamp
    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_else(Utc::now)
    }
}

/// Which of the two token kinds to issue or verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Issues and validates the access/refresh token pair
pub struct JwtService {
    access_secret: String,
    refresh_secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    fn ttl_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    /// Issue a token of the given kind; returns the encoded token and the
    /// claims that went into it.
    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: &str,
        device_id: &str,
    ) -> Result<(String, Claims)> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            device_id: device_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.ttl_secs(kind),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret(kind)),
        )
        .context("Failed to encode token")?;

        Ok((token, claims))
    }

    /// Validate a token of the given kind.
    ///
    /// Fails closed: any expiry, signature or format problem yields `None`.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &DecodingKey::from_secret(self.secret(kind)), &validation)
            .map(|data| data.claims)
            .ok()
    }
}
