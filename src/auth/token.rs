use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{config::AppConfig, errors::AuthError};

/// Claims
///
/// The payload signed into every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): id of the identity the token was issued to.
    pub sub: i64,
    /// Issued At (iat), seconds since the Unix epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the Unix epoch. The token is valid while
    /// `iat <= now < exp`.
    pub exp: i64,
}

/// The claim data a verified token yields to the rest of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject_id: i64,
    pub expires_at: i64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

/// TokenService
///
/// Issues and verifies HS256 access tokens with the process-wide secret. The keys are
/// derived once at startup and shared behind an `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                ttl_secs,
            }),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_secs)
    }

    pub fn ttl_secs(&self) -> i64 {
        self.keys.ttl_secs
    }

    /// Issues a token for `subject_id`, valid from now for the configured lifetime.
    pub fn issue(&self, subject_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(subject_id, Utc::now().timestamp())
    }

    pub fn issue_at(
        &self,
        subject_id: i64,
        issued_at: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: subject_id,
            iat: issued_at,
            // Saturates instead of wrapping for lifetimes near `i64::MAX`.
            exp: issued_at.saturating_add(self.keys.ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
    }

    /// Verifies signature and validity window against the current time.
    pub fn verify(&self, raw_token: &str) -> Result<VerifiedToken, AuthError> {
        self.verify_at(raw_token, Utc::now().timestamp())
    }

    /// verify_at
    ///
    /// Checks the signature, then the window `[iat, exp)` against `now`. Every failure
    /// (empty, malformed, tampered, expired, not yet valid) is `Unauthenticated`.
    pub fn verify_at(&self, raw_token: &str, now: i64) -> Result<VerifiedToken, AuthError> {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below with no leeway; the library default allows 60s.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(raw_token, &self.keys.decoding, &validation)
            .map_err(|e| {
                tracing::debug!(kind = ?e.kind(), "token rejected");
                AuthError::Unauthenticated
            })?
            .claims;

        if now >= claims.exp || now < claims.iat {
            tracing::debug!(exp = claims.exp, now, "token outside its validity window");
            return Err(AuthError::Unauthenticated);
        }

        Ok(VerifiedToken {
            subject_id: claims.sub,
            expires_at: claims.exp,
        })
    }
}
