//! Verify Email Use Case
//!
//! Consumes a presented verification secret.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::verification;
use crate::error::{IdentityError, IdentityResult};

/// Verify email use case
pub struct VerifyEmailUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> VerifyEmailUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Digest the presented secret and atomically consume the matching
    /// pending verification.
    ///
    /// Wrong secret, already-consumed secret and expired secret are all the
    /// same `TokenInvalidOrExpired` outcome; the consume is a single
    /// read-modify-write in the store, so exactly one of any number of
    /// concurrent attempts with the same secret can succeed.
    pub async fn execute(&self, raw_secret: &str) -> IdentityResult<Account> {
        let digest = verification::digest_secret(raw_secret);

        let account = self
            .repo
            .consume_verification(&digest, Utc::now())
            .await?
            .ok_or(IdentityError::TokenInvalidOrExpired)?;

        tracing::info!(account_id = %account.account_id, "Email verified");

        Ok(account)
    }
}
