//! Use-case tests for the identity crate
//!
//! Driven through the in-memory repository and the recording mailer, so the
//! full register -> verify -> login -> resolve flow runs without Postgres or
//! an SMTP relay.

use std::sync::Arc;

use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, DeleteAccountUseCase, LoginInput, LoginUseCase,
    RegisterInput, RegisterUseCase, ResendOutcome, ResendVerificationUseCase,
    ResolveSessionUseCase, UpdateRoleUseCase, VerifyEmailUseCase,
};
use crate::application::config::IdentityConfig;
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{AccountRole, DisplayName, Email};
use crate::domain::verification;
use crate::error::IdentityError;
use crate::infra::mailer::MemoryMailer;
use crate::infra::memory::MemoryAccountRepository;

struct Harness {
    repo: Arc<MemoryAccountRepository>,
    mailer: Arc<MemoryMailer>,
    config: Arc<IdentityConfig>,
}

impl Harness {
    fn new() -> Self {
        Self {
            repo: Arc::new(MemoryAccountRepository::new()),
            mailer: Arc::new(MemoryMailer::new()),
            config: Arc::new(IdentityConfig::development()),
        }
    }

    async fn register(&self, email: &str, display_name: &str, password: &str) -> Account {
        RegisterUseCase::new(self.repo.clone(), self.mailer.clone(), self.config.clone())
            .execute(RegisterInput {
                email: email.to_string(),
                display_name: display_name.to_string(),
                password: password.to_string(),
            })
            .await
            .expect("registration failed")
            .account
    }

    /// The raw secret as the user would receive it: out of the email link.
    fn last_mailed_secret(&self) -> String {
        let sent = self.mailer.sent();
        let body = &sent.last().expect("no mail recorded").html_body;
        let (_, rest) = body
            .split_once("/auth/verify-email/")
            .expect("no verification link in mail");
        rest.split('"').next().unwrap().to_string()
    }

    async fn verify_last_secret(&self) -> Account {
        VerifyEmailUseCase::new(self.repo.clone())
            .execute(&self.last_mailed_secret())
            .await
            .expect("verification failed")
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        LoginUseCase::new(self.repo.clone(), self.config.clone())
            .execute(LoginInput {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .map(|out| out.token.token)
    }

    async fn resolve(&self, token: &str) -> Result<Account, IdentityError> {
        ResolveSessionUseCase::new(self.repo.clone(), self.config.clone())
            .execute(token)
            .await
    }
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_creates_unverified_account_with_pending_secret() {
    let h = Harness::new();
    let account = h.register("a@x.com", "Ada", "pw123456").await;

    assert!(!account.email_verified);
    assert!(account.has_pending_verification());
    assert_eq!(account.role, AccountRole::User);

    // Exactly one mail went out, to the registrant, carrying the secret
    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "a@x.com");

    // The stored digest matches the mailed secret, and is not the secret
    let secret = h.last_mailed_secret();
    let stored = h
        .repo
        .find_by_id(&account.account_id)
        .await
        .unwrap()
        .unwrap();
    let pending = stored.verification.unwrap();
    assert_eq!(pending.digest, verification::digest_secret(&secret));
    assert_ne!(pending.digest, secret.as_bytes());
}

#[tokio::test]
async fn register_rolls_back_pending_token_when_mail_fails() {
    let repo = Arc::new(MemoryAccountRepository::new());
    let mailer = Arc::new(MemoryMailer::failing());
    let config = Arc::new(IdentityConfig::development());

    let result = RegisterUseCase::new(repo.clone(), mailer, config)
        .execute(RegisterInput {
            email: "a@x.com".to_string(),
            display_name: "Ada".to_string(),
            password: "pw123456".to_string(),
        })
        .await;

    assert!(matches!(result, Err(IdentityError::EmailDelivery(_))));

    // The account survives, but in a consistent no-pending-token state
    let email = Email::new("a@x.com").unwrap();
    let account = repo.find_by_email(&email).await.unwrap().unwrap();
    assert!(!account.email_verified);
    assert!(!account.has_pending_verification());
}

#[tokio::test]
async fn register_rejects_taken_email_and_display_name() {
    let h = Harness::new();
    h.register("a@x.com", "Ada", "pw123456").await;

    let use_case = RegisterUseCase::new(h.repo.clone(), h.mailer.clone(), h.config.clone());

    let dup_email = use_case
        .execute(RegisterInput {
            email: "a@x.com".to_string(),
            display_name: "Someone Else".to_string(),
            password: "pw123456".to_string(),
        })
        .await;
    assert!(matches!(dup_email, Err(IdentityError::EmailTaken)));

    // Display-name uniqueness is case-insensitive
    let dup_name = use_case
        .execute(RegisterInput {
            email: "b@x.com".to_string(),
            display_name: "ADA".to_string(),
            password: "pw123456".to_string(),
        })
        .await;
    assert!(matches!(dup_name, Err(IdentityError::DisplayNameTaken)));
}

#[tokio::test]
async fn display_name_uniqueness_ignores_the_account_itself() {
    let h = Harness::new();
    let account = h.register("a@x.com", "Ada", "pw123456").await;

    // Taken when compared against everyone, free when the account itself is
    // excluded, so an update keeping the same name passes the write-time check
    assert!(h.repo.exists_by_display_name("ada", None).await.unwrap());
    assert!(
        !h.repo
            .exists_by_display_name("ada", Some(&account.account_id))
            .await
            .unwrap()
    );
}

// ============================================================================
// Verification
// ============================================================================

#[tokio::test]
async fn verification_secret_is_single_use() {
    let h = Harness::new();
    h.register("a@x.com", "Ada", "pw123456").await;
    let secret = h.last_mailed_secret();

    let verified = h.verify_last_secret().await;
    assert!(verified.email_verified);
    assert!(!verified.has_pending_verification());

    // The same secret presented again is dead
    let second = VerifyEmailUseCase::new(h.repo.clone()).execute(&secret).await;
    assert!(matches!(second, Err(IdentityError::TokenInvalidOrExpired)));
}

#[tokio::test]
async fn expired_secret_is_rejected_even_if_correct() {
    let h = Harness::new();

    // Plant an account whose pending verification is already expired
    let issued = verification::issue(chrono::Duration::minutes(-1));
    let mut account = Account::new(
        Email::new("a@x.com").unwrap(),
        DisplayName::new("Ada").unwrap(),
        None,
    );
    account.begin_verification(issued.pending);
    h.repo.insert(&account).await.unwrap();

    let result = VerifyEmailUseCase::new(h.repo.clone())
        .execute(&issued.raw_secret)
        .await;
    assert!(matches!(result, Err(IdentityError::TokenInvalidOrExpired)));

    // And the account stays unverified
    let stored = h.repo.find_by_id(&account.account_id).await.unwrap().unwrap();
    assert!(!stored.email_verified);
}

#[tokio::test]
async fn reissue_permanently_invalidates_prior_secret() {
    let h = Harness::new();
    h.register("a@x.com", "Ada", "pw123456").await;
    let first_secret = h.last_mailed_secret();

    let outcome = ResendVerificationUseCase::new(h.repo.clone(), h.mailer.clone(), h.config.clone())
        .execute("a@x.com".to_string())
        .await
        .unwrap();
    assert_eq!(outcome, ResendOutcome::Sent);

    let second_secret = h.last_mailed_secret();
    assert_ne!(first_secret, second_secret);

    // The first secret had time left, but reissue killed it
    let stale = VerifyEmailUseCase::new(h.repo.clone())
        .execute(&first_secret)
        .await;
    assert!(matches!(stale, Err(IdentityError::TokenInvalidOrExpired)));

    let fresh = VerifyEmailUseCase::new(h.repo.clone())
        .execute(&second_secret)
        .await
        .unwrap();
    assert!(fresh.email_verified);
}

#[tokio::test]
async fn resend_is_enumeration_safe() {
    let h = Harness::new();
    h.register("known@x.com", "Ada", "pw123456").await;

    let use_case =
        ResendVerificationUseCase::new(h.repo.clone(), h.mailer.clone(), h.config.clone());

    // Unknown address and real unverified account: identical outcome
    let unknown = use_case.execute("nobody@x.com".to_string()).await.unwrap();
    let unverified = use_case.execute("known@x.com".to_string()).await.unwrap();
    assert_eq!(unknown, ResendOutcome::Sent);
    assert_eq!(unverified, ResendOutcome::Sent);

    // A verified account gets the distinct signal
    h.verify_last_secret().await;
    let verified = use_case.execute("known@x.com".to_string()).await.unwrap();
    assert_eq!(verified, ResendOutcome::AlreadyVerified);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_requires_verification_regardless_of_password() {
    let h = Harness::new();
    h.register("a@x.com", "Ada", "pw123456").await;

    // Correct and wrong password both surface Unverified, nothing else
    let with_correct = h.login("a@x.com", "pw123456").await;
    assert!(matches!(with_correct, Err(IdentityError::Unverified)));

    let with_wrong = h.login("a@x.com", "wrong-password").await;
    assert!(matches!(with_wrong, Err(IdentityError::Unverified)));
}

#[tokio::test]
async fn login_never_distinguishes_unknown_email_from_wrong_password() {
    let h = Harness::new();
    h.register("a@x.com", "Ada", "pw123456").await;
    h.verify_last_secret().await;

    let unknown_email = h.login("nobody@x.com", "pw123456").await;
    let wrong_password = h.login("a@x.com", "not-the-password").await;

    assert!(matches!(unknown_email, Err(IdentityError::InvalidCredentials)));
    assert!(matches!(
        wrong_password,
        Err(IdentityError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn login_issues_token_that_resolves_to_the_account() {
    let h = Harness::new();
    let account = h.register("a@x.com", "Ada", "pw123456").await;
    h.verify_last_secret().await;

    let token = h.login("a@x.com", "pw123456").await.unwrap();
    let resolved = h.resolve(&token).await.unwrap();

    assert_eq!(resolved.account_id, account.account_id);
    assert_eq!(resolved.email.as_str(), "a@x.com");
}

// ============================================================================
// Session revocation (token epoch)
// ============================================================================

#[tokio::test]
async fn password_change_invalidates_outstanding_tokens() {
    let h = Harness::new();
    h.register("a@x.com", "Ada", "pw123456").await;
    h.verify_last_secret().await;

    let old_token = h.login("a@x.com", "pw123456").await.unwrap();
    assert!(h.resolve(&old_token).await.is_ok());

    let account = h
        .repo
        .find_by_email(&Email::new("a@x.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    ChangePasswordUseCase::new(h.repo.clone(), h.config.clone())
        .execute(
            &account,
            ChangePasswordInput {
                current_password: "pw123456".to_string(),
                new_password: "newpass99".to_string(),
            },
        )
        .await
        .unwrap();

    // The old token's epoch no longer matches; fails closed
    let stale = h.resolve(&old_token).await;
    assert!(matches!(stale, Err(IdentityError::TokenInvalidOrExpired)));

    // Old password is gone, new one logs in
    assert!(matches!(
        h.login("a@x.com", "pw123456").await,
        Err(IdentityError::InvalidCredentials)
    ));
    assert!(h.login("a@x.com", "newpass99").await.is_ok());
}

#[tokio::test]
async fn change_password_rejects_wrong_current_password() {
    let h = Harness::new();
    h.register("a@x.com", "Ada", "pw123456").await;
    h.verify_last_secret().await;

    let account = h
        .repo
        .find_by_email(&Email::new("a@x.com").unwrap())
        .await
        .unwrap()
        .unwrap();

    let result = ChangePasswordUseCase::new(h.repo.clone(), h.config.clone())
        .execute(
            &account,
            ChangePasswordInput {
                current_password: "not-the-password".to_string(),
                new_password: "newpass99".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(IdentityError::InvalidCredentials)));

    // Credential unchanged
    assert!(h.login("a@x.com", "pw123456").await.is_ok());
}

#[tokio::test]
async fn deleted_account_token_fails_closed() {
    let h = Harness::new();
    let account = h.register("a@x.com", "Ada", "pw123456").await;
    h.verify_last_secret().await;
    let token = h.login("a@x.com", "pw123456").await.unwrap();

    DeleteAccountUseCase::new(h.repo.clone())
        .execute(&account.account_id)
        .await
        .unwrap();

    // The signature still checks out, but the subject is gone
    let result = h.resolve(&token).await;
    assert!(matches!(result, Err(IdentityError::TokenInvalidOrExpired)));
}

// ============================================================================
// Role mutation
// ============================================================================

#[tokio::test]
async fn role_update_changes_role_and_kills_sessions() {
    let h = Harness::new();
    let account = h.register("a@x.com", "Ada", "pw123456").await;
    h.verify_last_secret().await;
    let token = h.login("a@x.com", "pw123456").await.unwrap();

    let updated = UpdateRoleUseCase::new(h.repo.clone())
        .execute(&account.account_id, AccountRole::Admin)
        .await
        .unwrap();
    assert_eq!(updated.role, AccountRole::Admin);

    // Sessions issued under the old role are dead
    assert!(matches!(
        h.resolve(&token).await,
        Err(IdentityError::TokenInvalidOrExpired)
    ));
}

#[tokio::test]
async fn role_update_of_unknown_account_is_not_found() {
    let h = Harness::new();

    let result = UpdateRoleUseCase::new(h.repo.clone())
        .execute(&kernel::id::AccountId::new(), AccountRole::Admin)
        .await;
    assert!(matches!(result, Err(IdentityError::NotFound)));
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn register_verify_login_me_round_trip() {
    let h = Harness::new();

    h.register("a@x.com", "Ada", "pw123456").await;
    let verified = h.verify_last_secret().await;
    assert!(verified.email_verified);

    let token = h.login("a@x.com", "pw123456").await.unwrap();
    let me = h.resolve(&token).await.unwrap();

    // The public view of the resolved identity carries no credential material
    let body = serde_json::to_string(&crate::presentation::dto::AccountResponse::from(&me)).unwrap();
    assert!(body.contains("a@x.com"));
    assert!(body.contains("Ada"));
    assert!(!body.to_lowercase().contains("password"));
    assert!(!body.contains("$argon2"));
}
