//! Session Token Issuer/Validator
//!
//! Stateless bearer tokens: the claims travel inside the token, signed with
//! the process-wide secret. Wire format is
//! `base64url(claims JSON) . base64url(HMAC-SHA256(secret, payload))`.
//!
//! There is no server-side session record. Revocation works through the
//! `epoch` claim: it must match the account's current `token_epoch` when the
//! account is resolved, so bumping the stored counter kills every
//! outstanding token at once.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::application::config::IdentityConfig;
use crate::domain::entity::account::Account;
use crate::error::{IdentityError, IdentityResult};

/// Claims embedded in a bearer token. Reconstructed per request, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account UUID
    pub sub: Uuid,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds, exclusive)
    pub exp: i64,
    /// Account token epoch at issuance
    pub epoch: i32,
}

/// A freshly issued token plus its decoded claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

impl IssuedToken {
    pub fn expires_at_ms(&self) -> i64 {
        self.claims.exp * 1000
    }
}

/// Issues and validates signed session tokens.
#[derive(Clone)]
pub struct SessionTokenService {
    secret: [u8; 32],
    ttl_secs: i64,
}

impl SessionTokenService {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            secret: config.token_secret,
            ttl_secs: config.session_ttl_secs(),
        }
    }

    /// Issue a token for an account, valid from now.
    pub fn issue(&self, account: &Account) -> IdentityResult<IssuedToken> {
        self.issue_at(account, Utc::now().timestamp())
    }

    /// Issue a token with an explicit clock (tests drive expiry through this).
    pub fn issue_at(&self, account: &Account, iat: i64) -> IdentityResult<IssuedToken> {
        let claims = SessionClaims {
            sub: *account.account_id.as_uuid(),
            iat,
            exp: iat + self.ttl_secs,
            epoch: account.token_epoch,
        };

        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| IdentityError::Internal(format!("Claims serialization: {e}")))?,
        );

        let token = format!("{}.{}", payload, self.sign(&payload));

        Ok(IssuedToken { token, claims })
    }

    /// Validate a presented token.
    ///
    /// Structural, signature and expiry failures all collapse into the one
    /// `TokenInvalidOrExpired` outcome; callers never learn which check
    /// failed.
    pub fn validate(&self, token: &str) -> IdentityResult<SessionClaims> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validate with an explicit clock.
    pub fn validate_at(&self, token: &str, now: i64) -> IdentityResult<SessionClaims> {
        let (payload, signature_b64) = token
            .split_once('.')
            .ok_or(IdentityError::TokenInvalidOrExpired)?;

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| IdentityError::TokenInvalidOrExpired)?;

        // Constant-time comparison
        mac.verify_slice(&signature)
            .map_err(|_| IdentityError::TokenInvalidOrExpired)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| IdentityError::TokenInvalidOrExpired)?;

        let claims: SessionClaims = serde_json::from_slice(&claims_bytes)
            .map_err(|_| IdentityError::TokenInvalidOrExpired)?;

        if claims.exp <= now {
            return Err(IdentityError::TokenInvalidOrExpired);
        }

        Ok(claims)
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}
