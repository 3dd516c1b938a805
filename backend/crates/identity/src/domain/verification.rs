//! Email Verification Token Protocol
//!
//! Pure token arithmetic: generating a one-time secret and digesting a
//! presented one. Persistence and atomic consumption live in the repository;
//! sending lives in the mailer.
//!
//! Only the SHA-256 digest of a secret is ever stored. The raw secret exists
//! in process memory once, on its way into the verification email, and is
//! never logged.

use chrono::{DateTime, Duration, Utc};

use platform::crypto::{random_bytes, sha256, to_base64url};

/// Raw secret entropy in bytes (256 bits)
pub const VERIFICATION_SECRET_BYTES: usize = 32;

/// The stored half of a pending verification.
///
/// Both fields live and die together: a pending verification either exists
/// completely or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    /// SHA-256 digest of the raw secret
    pub digest: Vec<u8>,
    /// Hard expiry; a secret presented after this instant is dead
    pub expires_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A freshly issued verification: the raw secret for the email link plus the
/// storable pending state.
#[derive(Debug)]
pub struct IssuedVerification {
    pub raw_secret: String,
    pub pending: PendingVerification,
}

/// Issue a new verification secret valid for `ttl`.
pub fn issue(ttl: Duration) -> IssuedVerification {
    let secret_bytes = random_bytes(VERIFICATION_SECRET_BYTES);
    let raw_secret = to_base64url(&secret_bytes);
    let digest = digest_secret(&raw_secret);

    IssuedVerification {
        raw_secret,
        pending: PendingVerification {
            digest,
            expires_at: Utc::now() + ttl,
        },
    }
}

/// Digest a presented secret for lookup against stored digests.
pub fn digest_secret(raw_secret: &str) -> Vec<u8> {
    sha256(raw_secret.as_bytes()).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_produces_unique_secrets() {
        let a = issue(Duration::minutes(10));
        let b = issue(Duration::minutes(10));
        assert_ne!(a.raw_secret, b.raw_secret);
        assert_ne!(a.pending.digest, b.pending.digest);
    }

    #[test]
    fn test_secret_has_enough_entropy() {
        let issued = issue(Duration::minutes(10));
        // 32 random bytes base64url-encoded: 43 characters, no padding
        assert_eq!(issued.raw_secret.len(), 43);
        assert!(!issued.raw_secret.contains('='));
    }

    #[test]
    fn test_digest_matches_issued_pending() {
        let issued = issue(Duration::minutes(10));
        assert_eq!(digest_secret(&issued.raw_secret), issued.pending.digest);
    }

    #[test]
    fn test_expiry() {
        let issued = issue(Duration::minutes(10));
        let now = Utc::now();
        assert!(!issued.pending.is_expired_at(now));
        assert!(issued.pending.is_expired_at(now + Duration::minutes(11)));
        // Expiry boundary is exclusive: expires_at itself is expired
        assert!(issued.pending.is_expired_at(issued.pending.expires_at));
    }
}
