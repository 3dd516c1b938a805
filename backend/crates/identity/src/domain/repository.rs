//! Repository Traits
//!
//! Interface to the credential store. Implementation is in the
//! infrastructure layer; the store must provide per-record atomic updates.

use chrono::{DateTime, Utc};
use kernel::id::AccountId;

use crate::domain::entity::account::Account;
use crate::domain::value_object::Email;
use crate::error::IdentityResult;

/// Account repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Insert a new account
    async fn insert(&self, account: &Account) -> IdentityResult<()>;

    /// Find account by ID
    async fn find_by_id(&self, account_id: &AccountId) -> IdentityResult<Option<Account>>;

    /// Find account by email (exact, case-sensitive match)
    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<Account>>;

    /// Check whether a canonical display name is taken by any account other
    /// than `exclude`
    async fn exists_by_display_name(
        &self,
        canonical: &str,
        exclude: Option<&AccountId>,
    ) -> IdentityResult<bool>;

    /// Update an existing account
    async fn update(&self, account: &Account) -> IdentityResult<()>;

    /// Hard-delete an account. Returns false if it did not exist.
    async fn delete(&self, account_id: &AccountId) -> IdentityResult<bool>;

    /// Atomically consume a pending verification.
    ///
    /// In one read-modify-write: find the account whose stored digest equals
    /// `digest` and whose expiry is after `now`, mark it verified, clear both
    /// verification fields, and return it. Returns `None` on any miss (wrong
    /// secret, already consumed, or expired) so callers cannot tell which.
    ///
    /// Atomicity makes consumption exactly-once under concurrent attempts
    /// with the same secret.
    async fn consume_verification(
        &self,
        digest: &[u8],
        now: DateTime<Utc>,
    ) -> IdentityResult<Option<Account>>;
}
