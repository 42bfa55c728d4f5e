//! Bearer-token authentication.
//!
//! Tokens are HMAC-SHA256 signed strings carrying an email and an expiry:
//! `base64url(email|expiry_unix|hex_signature)`. Verification checks the
//! signature and expiry, then requires the email to appear in the
//! authorized-emails allow-list file (`{"authorized_emails": [...]}`,
//! case-insensitive).
//!
//! The HTTP layer consumes this module only through the [`Authorizer`]
//! trait, one opaque "is this caller authorized" predicate injected at
//! startup. Authorization failures are surfaced to the caller; they never
//! affect the scan loop.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or tampered token. Maps to HTTP 401.
    #[error("invalid token")]
    InvalidToken,

    /// Signature is fine but the token has expired. Maps to HTTP 401.
    #[error("token expired")]
    Expired,

    /// Valid token for an email missing from the allow-list. Maps to 403.
    #[error("email '{0}' is not authorized")]
    NotAuthorized(String),
}

/// Verified identity extracted from a token.
#[derive(Debug, Clone)]
pub struct AuthClaims {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Opaque authorization predicate consumed by the HTTP layer.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, token: &str) -> Result<AuthClaims, AuthError>;
}

#[derive(Debug, Deserialize)]
struct EmailAllowList {
    #[serde(default)]
    authorized_emails: Vec<String>,
}

pub struct TokenAuthorizer {
    secret: Vec<u8>,
    /// Lowercased allow-list.
    authorized: Vec<String>,
}

impl TokenAuthorizer {
    /// Build the authorizer from config: the signing secret comes from the
    /// environment (missing secret is a fatal startup error); a missing
    /// allow-list file yields an empty list, which rejects everyone.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let secret = std::env::var(&config.secret_env).with_context(|| {
            format!(
                "{} environment variable not set (token signing secret)",
                config.secret_env
            )
        })?;
        let authorized = load_allow_list(&config.authorized_emails_file);
        Ok(Self::new(secret.into_bytes(), authorized))
    }

    pub fn new(secret: Vec<u8>, authorized: Vec<String>) -> Self {
        Self {
            secret,
            authorized: authorized.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Mint a token for `email` valid for `ttl`.
    pub fn issue(&self, email: &str, ttl: Duration) -> String {
        let expires_at = (Utc::now() + ttl).timestamp();
        let payload = format!("{email}|{expires_at}");
        let signature = self.sign(&payload);
        URL_SAFE_NO_PAD.encode(format!("{payload}|{signature}"))
    }

    pub fn is_email_authorized(&self, email: &str) -> bool {
        self.authorized.contains(&email.to_lowercase())
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify_signature(&self, payload: &str, signature_hex: &str) -> Result<(), AuthError> {
        let signature = hex::decode(signature_hex).map_err(|_| AuthError::InvalidToken)?;
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)
    }
}

impl Authorizer for TokenAuthorizer {
    fn authorize(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AuthError::InvalidToken)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidToken)?;

        let mut parts = decoded.splitn(3, '|');
        let (email, expiry, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(e), Some(x), Some(s)) if !e.is_empty() => (e, x, s),
            _ => return Err(AuthError::InvalidToken),
        };

        // Signature before expiry: a tampered expiry must read as invalid,
        // not expired.
        self.verify_signature(&format!("{email}|{expiry}"), signature)?;

        let expires_at = expiry
            .parse::<i64>()
            .ok()
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .ok_or(AuthError::InvalidToken)?;
        if expires_at <= Utc::now() {
            return Err(AuthError::Expired);
        }

        if !self.is_email_authorized(email) {
            return Err(AuthError::NotAuthorized(email.to_string()));
        }

        Ok(AuthClaims {
            email: email.to_string(),
            expires_at,
        })
    }
}

fn load_allow_list(path: &Path) -> Vec<String> {
    match std::fs::read(path) {
        Ok(bytes) => match serde_json::from_slice::<EmailAllowList>(&bytes) {
            Ok(list) => list.authorized_emails,
            Err(err) => {
                warn!(path = %path.display(), %err, "authorized-emails file is corrupt, allow-list is empty");
                Vec::new()
            }
        },
        Err(err) => {
            warn!(path = %path.display(), %err, "authorized-emails file unavailable, allow-list is empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorizer() -> TokenAuthorizer {
        TokenAuthorizer::new(
            b"test-secret".to_vec(),
            vec!["Engenharia@Example.com".to_string()],
        )
    }

    #[test]
    fn issued_token_verifies_for_allowed_email() {
        let auth = authorizer();
        let token = auth.issue("engenharia@example.com", Duration::days(7));
        let claims = auth.authorize(&token).unwrap();
        assert_eq!(claims.email, "engenharia@example.com");
        assert!(claims.expires_at > Utc::now());
    }

    #[test]
    fn allow_list_is_case_insensitive() {
        let auth = authorizer();
        let token = auth.issue("ENGENHARIA@EXAMPLE.COM", Duration::days(1));
        assert!(auth.authorize(&token).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = authorizer();
        let token = auth.issue("engenharia@example.com", Duration::seconds(-10));
        assert!(matches!(auth.authorize(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let auth = authorizer();
        let token = auth.issue("engenharia@example.com", Duration::days(1));

        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&token).unwrap()).unwrap();
        let tampered = decoded.replacen("engenharia", "intruso000", 1);
        let tampered = URL_SAFE_NO_PAD.encode(tampered);

        assert!(matches!(
            auth.authorize(&tampered),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn unlisted_email_is_forbidden() {
        let auth = authorizer();
        let token = auth.issue("visitante@example.com", Duration::days(1));
        assert!(matches!(
            auth.authorize(&token),
            Err(AuthError::NotAuthorized(email)) if email == "visitante@example.com"
        ));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let auth = authorizer();
        assert!(matches!(
            auth.authorize("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }
}
