//! Resolve Session Use Case
//!
//! Turns a presented bearer token into a live account, or the single
//! invalid outcome.

use std::sync::Arc;

use kernel::id::AccountId;

use crate::application::config::IdentityConfig;
use crate::application::session_token::SessionTokenService;
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::error::{IdentityError, IdentityResult};

/// Resolve session use case
pub struct ResolveSessionUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<IdentityConfig>,
}

impl<R> ResolveSessionUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<IdentityConfig>) -> Self {
        Self { repo, config }
    }

    /// Validate the token cryptographically, then require that its subject
    /// still resolves to an account and that the claim's epoch matches the
    /// account's current one.
    ///
    /// A deleted account or a bumped epoch fails closed as
    /// `TokenInvalidOrExpired`, never as "no user attached".
    pub async fn execute(&self, token: &str) -> IdentityResult<Account> {
        let claims = SessionTokenService::new(&self.config).validate(token)?;

        let account_id = AccountId::from_uuid(claims.sub);
        let account = self
            .repo
            .find_by_id(&account_id)
            .await?
            .ok_or(IdentityError::TokenInvalidOrExpired)?;

        if account.token_epoch != claims.epoch {
            return Err(IdentityError::TokenInvalidOrExpired);
        }

        Ok(account)
    }
}
