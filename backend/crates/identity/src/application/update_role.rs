//! Update Role Use Case
//!
//! Admin-only mutation of the account-wide role. The HTTP layer gates the
//! caller; this use case mutates the target.

use std::sync::Arc;

use kernel::id::AccountId;

use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::AccountRole;
use crate::error::{IdentityError, IdentityResult};

/// Update role use case
pub struct UpdateRoleUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> UpdateRoleUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Set the target's role. Bumps the target's token epoch: a role change
    /// must not leave sessions alive that still carry the old role's reach.
    pub async fn execute(
        &self,
        target_id: &AccountId,
        role: AccountRole,
    ) -> IdentityResult<Account> {
        let mut account = self
            .repo
            .find_by_id(target_id)
            .await?
            .ok_or(IdentityError::NotFound)?;

        account.set_role(role);
        self.repo.update(&account).await?;

        tracing::info!(
            account_id = %account.account_id,
            role = %role,
            "Account role updated"
        );

        Ok(account)
    }
}
