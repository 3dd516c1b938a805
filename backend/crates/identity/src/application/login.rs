//! Login Use Case
//!
//! Verifies a credential and issues a bearer session token.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::session_token::{IssuedToken, SessionTokenService};
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::Email;
use crate::error::{IdentityError, IdentityResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login output
pub struct LoginOutput {
    pub token: IssuedToken,
    pub account: Account,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<IdentityConfig>,
}

impl<R> LoginUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<IdentityConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: LoginInput) -> IdentityResult<LoginOutput> {
        // Malformed email can't match any account; same outcome as a miss
        let email = Email::new(input.email).map_err(|_| IdentityError::InvalidCredentials)?;

        let account = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        // Unverified accounts get the distinct code regardless of password
        // correctness, so clients can offer a resend
        if !account.email_verified {
            return Err(IdentityError::Unverified);
        }

        let password_hash = account
            .password_hash
            .as_ref()
            .ok_or(IdentityError::InvalidCredentials)?;

        let password = platform::password::ClearTextPassword::new(input.password)
            .map_err(|_| IdentityError::InvalidCredentials)?;

        if !password_hash.verify(&password, self.config.pepper()) {
            tracing::warn!(account_id = %account.account_id, "Failed login attempt");
            return Err(IdentityError::InvalidCredentials);
        }

        let token = SessionTokenService::new(&self.config).issue(&account)?;

        tracing::info!(account_id = %account.account_id, "Signed in");

        Ok(LoginOutput { token, account })
    }
}
