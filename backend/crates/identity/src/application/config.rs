//! Application Configuration
//!
//! Configuration for the identity application layer. Everything here is
//! process-wide, read-only state loaded once at startup; the signing secret
//! is injected explicitly so tests can supply deterministic keys.

use std::time::Duration;

use platform::password::WorkFactor;

/// Identity application configuration
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Session token signing secret for HMAC-SHA256 (32 bytes)
    pub token_secret: [u8; 32],
    /// Bearer session lifetime (1 day)
    pub session_ttl: Duration,
    /// Email verification secret lifetime (10 minutes)
    pub verification_ttl: Duration,
    /// Argon2id work factor for password hashing
    pub work_factor: WorkFactor,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Public base URL embedded in verification links
    pub base_url: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            session_ttl: Duration::from_secs(24 * 3600), // 1 day
            verification_ttl: Duration::from_secs(10 * 60), // 10 minutes
            work_factor: WorkFactor::default(),
            password_pepper: None,
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl IdentityConfig {
    /// Create config with a random signing secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development and tests (cheap hashing)
    pub fn development() -> Self {
        Self {
            work_factor: WorkFactor::fast_insecure(),
            ..Self::with_random_secret()
        }
    }

    /// Get session TTL in seconds
    pub fn session_ttl_secs(&self) -> i64 {
        self.session_ttl.as_secs() as i64
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Verification link for a freshly issued raw secret
    pub fn verification_link(&self, raw_secret: &str) -> String {
        format!(
            "{}/auth/verify-email/{}",
            self.base_url.trim_end_matches('/'),
            raw_secret
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lifetimes() {
        let config = IdentityConfig::default();
        assert_eq!(config.session_ttl, Duration::from_secs(86_400));
        assert_eq!(config.verification_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_with_random_secret() {
        let a = IdentityConfig::with_random_secret();
        let b = IdentityConfig::with_random_secret();
        assert_ne!(a.token_secret, b.token_secret);
        assert!(a.token_secret.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_verification_link() {
        let config = IdentityConfig {
            base_url: "https://app.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.verification_link("abc123"),
            "https://app.example.com/auth/verify-email/abc123"
        );
    }
}
