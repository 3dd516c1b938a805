//! Account Entity
//!
//! The identity root. Credential material (the password hash) stays inside
//! the entity and never crosses the presentation boundary.

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use platform::password::HashedPassword;

use crate::domain::value_object::{AccountRole, DisplayName, Email};
use crate::domain::verification::PendingVerification;

/// Account entity
#[derive(Debug, Clone)]
pub struct Account {
    /// Internal UUID identifier, assigned at creation, immutable
    pub account_id: AccountId,
    /// Login identity key; unique as stored (case-sensitive)
    pub email: Email,
    /// Unique across all other accounts when compared case-insensitively
    pub display_name: DisplayName,
    /// Absent for accounts created without a local password
    pub password_hash: Option<HashedPassword>,
    /// Account-wide role; mutable only by an admin identity
    pub role: AccountRole,
    /// Flips false -> true at most once, via the verification protocol
    pub email_verified: bool,
    /// Present only while a verification is pending; digest and expiry are
    /// one value so they can never be cleared separately
    pub verification: Option<PendingVerification>,
    /// Compared against session claims at validation time; bumping it
    /// invalidates every outstanding token for this account
    pub token_epoch: i32,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new unverified account
    pub fn new(
        email: Email,
        display_name: DisplayName,
        password_hash: Option<HashedPassword>,
    ) -> Self {
        let now = Utc::now();

        Self {
            account_id: AccountId::new(),
            email,
            display_name,
            password_hash,
            role: AccountRole::default(),
            email_verified: false,
            verification: None,
            token_epoch: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a pending verification, replacing any prior one.
    ///
    /// The previous raw secret (if any) becomes permanently unusable.
    pub fn begin_verification(&mut self, pending: PendingVerification) {
        self.verification = Some(pending);
        self.updated_at = Utc::now();
    }

    /// Drop the pending verification without verifying.
    ///
    /// Used to roll back when the verification email cannot be delivered.
    pub fn clear_verification(&mut self) {
        self.verification = None;
        self.updated_at = Utc::now();
    }

    /// Terminal transition of the verification state machine.
    pub fn mark_verified(&mut self) {
        self.email_verified = true;
        self.verification = None;
        self.updated_at = Utc::now();
    }

    /// Replace the password credential and invalidate outstanding sessions.
    pub fn set_password(&mut self, password_hash: HashedPassword) {
        self.password_hash = Some(password_hash);
        self.bump_token_epoch();
    }

    /// Change the account-wide role and invalidate outstanding sessions.
    pub fn set_role(&mut self, role: AccountRole) {
        self.role = role;
        self.bump_token_epoch();
    }

    /// Invalidate every session token issued before this call.
    pub fn bump_token_epoch(&mut self) {
        self.token_epoch = self.token_epoch.wrapping_add(1);
        self.updated_at = Utc::now();
    }

    pub fn has_pending_verification(&self) -> bool {
        self.verification.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verification;
    use chrono::Duration;

    fn account() -> Account {
        Account::new(
            Email::new("ada@example.com").unwrap(),
            DisplayName::new("Ada").unwrap(),
            None,
        )
    }

    #[test]
    fn test_new_account_starts_unverified() {
        let account = account();
        assert!(!account.email_verified);
        assert!(!account.has_pending_verification());
        assert_eq!(account.role, AccountRole::User);
        assert_eq!(account.token_epoch, 0);
    }

    #[test]
    fn test_mark_verified_clears_pending() {
        let mut account = account();
        let issued = verification::issue(Duration::minutes(10));
        account.begin_verification(issued.pending);
        assert!(account.has_pending_verification());

        account.mark_verified();
        assert!(account.email_verified);
        assert!(!account.has_pending_verification());
    }

    #[test]
    fn test_begin_verification_replaces_prior() {
        let mut account = account();
        let first = verification::issue(Duration::minutes(10));
        let second = verification::issue(Duration::minutes(10));

        account.begin_verification(first.pending.clone());
        account.begin_verification(second.pending.clone());

        let current = account.verification.as_ref().unwrap();
        assert_eq!(current.digest, second.pending.digest);
        assert_ne!(current.digest, first.pending.digest);
    }

    #[test]
    fn test_password_change_bumps_epoch() {
        use platform::password::{ClearTextPassword, WorkFactor};

        let mut account = account();
        let epoch = account.token_epoch;
        let hash = ClearTextPassword::new("pw123456".to_string())
            .unwrap()
            .hash(&WorkFactor::fast_insecure(), None)
            .unwrap();

        account.set_password(hash);
        assert_eq!(account.token_epoch, epoch + 1);
    }

    #[test]
    fn test_role_change_bumps_epoch() {
        let mut account = account();
        let epoch = account.token_epoch;
        account.set_role(AccountRole::Admin);
        assert_eq!(account.role, AccountRole::Admin);
        assert_eq!(account.token_epoch, epoch + 1);
    }
}
