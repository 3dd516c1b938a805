//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - Unified error type and result aliases
//! - Common primitive value objects (typed IDs)
//!
//! Design principle: only include things that are hard to change and mean
//! the same thing in every domain crate.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
