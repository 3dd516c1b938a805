//! Identity & Access Control core
//!
//! Clean Architecture structure:
//! - `domain/` - entities, value objects, authorization engine, repository traits
//! - `application/` - use cases and application services
//! - `infra/` - database and mailer implementations
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Registration with email verification (one-time, 10-minute secrets;
//!   only digests are stored)
//! - Login with Argon2id-hashed passwords, stateless signed bearer sessions
//! - Pure role/membership authorization engine
//! - Per-route-class fixed-window rate limiting
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Session tokens are HMAC-SHA256 signed claims; validation fails closed
//! - Token epoch embedded in claims invalidates sessions on password or
//!   role change
//! - Enumeration-sensitive responses are shape-identical for hits and misses

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::IdentityConfig;
pub use error::{IdentityError, IdentityResult};
pub use infra::postgres::PgAccountRepository;
pub use presentation::router::identity_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod mailer {
    pub use crate::infra::mailer::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
