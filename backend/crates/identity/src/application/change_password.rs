//! Change Password Use Case

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::error::{IdentityError, IdentityResult};

/// Change password input
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// Change password use case
pub struct ChangePasswordUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<IdentityConfig>,
}

impl<R> ChangePasswordUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<IdentityConfig>) -> Self {
        Self { repo, config }
    }

    /// Re-verify the current password, store the new hash, and bump the
    /// token epoch so every outstanding session token dies with the old
    /// credential.
    pub async fn execute(
        &self,
        account: &Account,
        input: ChangePasswordInput,
    ) -> IdentityResult<()> {
        let current_hash = account
            .password_hash
            .as_ref()
            .ok_or(IdentityError::InvalidCredentials)?;

        let current = platform::password::ClearTextPassword::new(input.current_password)
            .map_err(|_| IdentityError::InvalidCredentials)?;

        if !current_hash.verify(&current, self.config.pepper()) {
            return Err(IdentityError::InvalidCredentials);
        }

        let new_password = platform::password::ClearTextPassword::new(input.new_password)
            .map_err(|e| IdentityError::Validation(e.to_string()))?;
        let new_hash = new_password
            .hash(&self.config.work_factor, self.config.pepper())
            .map_err(|e| IdentityError::Internal(e.to_string()))?;

        let mut account = account.clone();
        account.set_password(new_hash);
        self.repo.update(&account).await?;

        tracing::info!(account_id = %account.account_id, "Password changed");

        Ok(())
    }
}
