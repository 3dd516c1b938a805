//! Register Use Case
//!
//! Creates a new unverified account and starts the email verification flow.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{DisplayName, Email};
use crate::domain::verification;
use crate::error::{IdentityError, IdentityResult};
use crate::infra::mailer::{self, Mailer};

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

/// Register output
pub struct RegisterOutput {
    pub account: Account,
}

/// Register use case
pub struct RegisterUseCase<R, M>
where
    R: AccountRepository,
    M: Mailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<IdentityConfig>,
}

impl<R, M> RegisterUseCase<R, M>
where
    R: AccountRepository,
    M: Mailer,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>, config: Arc<IdentityConfig>) -> Self {
        Self {
            repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> IdentityResult<RegisterOutput> {
        let email = Email::new(input.email)
            .map_err(|e| IdentityError::Validation(e.message().to_string()))?;
        let display_name = DisplayName::new(input.display_name)
            .map_err(|e| IdentityError::Validation(e.message().to_string()))?;

        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::EmailTaken);
        }

        if self
            .repo
            .exists_by_display_name(display_name.canonical(), None)
            .await?
        {
            return Err(IdentityError::DisplayNameTaken);
        }

        // Validate and hash password
        let password = platform::password::ClearTextPassword::new(input.password)
            .map_err(|e| IdentityError::Validation(e.to_string()))?;
        let password_hash = password
            .hash(&self.config.work_factor, self.config.pepper())
            .map_err(|e| IdentityError::Internal(e.to_string()))?;

        let mut account = Account::new(email, display_name, Some(password_hash));

        // Issue the verification secret before the first write so the
        // account is never persisted without a pending token
        let ttl = chrono::Duration::from_std(self.config.verification_ttl)
            .map_err(|e| IdentityError::Internal(format!("Invalid verification TTL: {e}")))?;
        let issued = verification::issue(ttl);
        account.begin_verification(issued.pending);

        self.repo.insert(&account).await?;

        // The raw secret leaves the process exactly here, inside the email
        let link = self.config.verification_link(&issued.raw_secret);
        let body = mailer::verification_email(account.display_name.original(), &link);

        if let Err(e) = self
            .mailer
            .send(account.email.as_str(), mailer::VERIFICATION_SUBJECT, &body)
            .await
        {
            // Roll the token back so the account is left consistently
            // pending-free rather than pending on a secret nobody received
            account.clear_verification();
            self.repo.update(&account).await?;
            return Err(IdentityError::EmailDelivery(e.to_string()));
        }

        tracing::info!(
            account_id = %account.account_id,
            "Account registered, verification email sent"
        );

        Ok(RegisterOutput { account })
    }
}
