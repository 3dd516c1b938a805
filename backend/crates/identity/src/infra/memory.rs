//! In-Memory Repository Implementation
//!
//! Backs the use-case tests and runs without Postgres. Semantics mirror the
//! Postgres implementation: store-level uniqueness on email, and
//! verification consumption as one atomic step under the lock.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use uuid::Uuid;

use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::Email;
use crate::error::{IdentityError, IdentityResult};

/// In-memory account repository
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Account>> {
        self.accounts.lock().expect("repository lock poisoned")
    }
}

impl AccountRepository for MemoryAccountRepository {
    async fn insert(&self, account: &Account) -> IdentityResult<()> {
        let mut accounts = self.lock();

        // Store-enforced uniqueness, as the UNIQUE constraints would
        if accounts
            .values()
            .any(|a| a.email.as_str() == account.email.as_str())
        {
            return Err(IdentityError::EmailTaken);
        }
        if accounts
            .values()
            .any(|a| a.display_name.canonical() == account.display_name.canonical())
        {
            return Err(IdentityError::DisplayNameTaken);
        }

        accounts.insert(*account.account_id.as_uuid(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> IdentityResult<Option<Account>> {
        Ok(self.lock().get(account_id.as_uuid()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<Account>> {
        Ok(self
            .lock()
            .values()
            .find(|a| a.email.as_str() == email.as_str())
            .cloned())
    }

    async fn exists_by_display_name(
        &self,
        canonical: &str,
        exclude: Option<&AccountId>,
    ) -> IdentityResult<bool> {
        Ok(self.lock().values().any(|a| {
            a.display_name.canonical() == canonical
                && exclude.is_none_or(|id| a.account_id != *id)
        }))
    }

    async fn update(&self, account: &Account) -> IdentityResult<()> {
        let mut accounts = self.lock();
        let id = *account.account_id.as_uuid();
        if accounts.contains_key(&id) {
            accounts.insert(id, account.clone());
        }
        Ok(())
    }

    async fn delete(&self, account_id: &AccountId) -> IdentityResult<bool> {
        Ok(self.lock().remove(account_id.as_uuid()).is_some())
    }

    async fn consume_verification(
        &self,
        digest: &[u8],
        now: DateTime<Utc>,
    ) -> IdentityResult<Option<Account>> {
        let mut accounts = self.lock();

        // Find-and-clear happens entirely under the lock, matching the
        // single-statement UPDATE of the Postgres implementation
        let matched = accounts.values_mut().find(|a| {
            a.verification
                .as_ref()
                .is_some_and(|v| v.digest == digest && v.expires_at > now)
        });

        Ok(matched.map(|account| {
            account.mark_verified();
            account.clone()
        }))
    }
}
