//! # yt-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and expiring JWT session tokens.

use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yt_core::models::Identity;
use yt_core::traits::AuthProvider;

/// Default lifetime of a session token: two weeks.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// User id.
    sub: Uuid,
    name: String,
    iat: i64,
    exp: i64,
}

pub struct SimpleAuthProvider {
    /// Key for signing session tokens; rotating it logs everyone out.
    session_secret: SecretString,
    session_ttl: Duration,
}

impl SimpleAuthProvider {
    /// Accepts a secret (e.g., from configuration)
    pub fn new(session_secret: SecretString) -> Self {
        Self {
            session_secret,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    fn encode_claims(&self, claims: &SessionClaims) -> anyhow::Result<String> {
        let key = EncodingKey::from_secret(self.session_secret.expose_secret().as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), claims, &key)?)
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("hashing password: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// HS256 JWT expiring `session_ttl` after issue.
    fn issue_session(&self, identity: &Identity) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.session_ttl.as_secs()).unwrap_or(i64::MAX);
        self.encode_claims(&SessionClaims {
            sub: identity.id,
            name: identity.username.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        })
    }

    fn verify_session(&self, token: &str) -> Option<Identity> {
        let key = DecodingKey::from_secret(self.session_secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<SessionClaims>(token, &key, &validation).ok()?;
        Some(Identity {
            id: data.claims.sub,
            username: data.claims.name,
        })
    }
}
