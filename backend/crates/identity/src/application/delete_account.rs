//! Delete Account Use Case
//!
//! Hard delete. An account is destroyed by its owner or by an admin; the
//! row disappearing is what fails outstanding tokens closed.

use std::sync::Arc;

use kernel::id::AccountId;

use crate::domain::repository::AccountRepository;
use crate::error::{IdentityError, IdentityResult};

/// Delete account use case
pub struct DeleteAccountUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> DeleteAccountUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Delete by id. Unknown ids surface as `NotFound` — the same answer an
    /// admin probing random ids would get for an id that never existed.
    pub async fn execute(&self, account_id: &AccountId) -> IdentityResult<()> {
        let deleted = self.repo.delete(account_id).await?;

        if !deleted {
            return Err(IdentityError::NotFound);
        }

        tracing::info!(account_id = %account_id, "Account deleted");

        Ok(())
    }
}
