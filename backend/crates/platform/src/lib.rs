//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random bytes, SHA-256, Base64)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Rate limiting infrastructure
//! - Client address extraction

pub mod client;
pub mod crypto;
pub mod password;
pub mod rate_limit;
