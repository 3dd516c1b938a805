//! Resend Verification Use Case
//!
//! Reissues the verification secret for an unverified account.
//!
//! Enumeration posture: an unknown address produces the same success-shaped
//! outcome as a real unverified account, while an already-verified account
//! gets a distinct signal. The asymmetry is intentional, inherited behavior;
//! see DESIGN.md before "fixing" it.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::Email;
use crate::domain::verification;
use crate::error::{IdentityError, IdentityResult};
use crate::infra::mailer::{self, Mailer};

/// Resend outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    /// Returned both for unknown addresses and for real unverified accounts
    Sent,
    /// Distinct signal for accounts that are already verified
    AlreadyVerified,
}

/// Resend verification use case
pub struct ResendVerificationUseCase<R, M>
where
    R: AccountRepository,
    M: Mailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<IdentityConfig>,
}

impl<R, M> ResendVerificationUseCase<R, M>
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

    pub async fn execute(&self, email: String) -> IdentityResult<ResendOutcome> {
        // An address that can't parse can't have an account; indistinguishable
        // from an unknown one
        let Ok(email) = Email::new(email) else {
            return Ok(ResendOutcome::Sent);
        };

        let Some(mut account) = self.repo.find_by_email(&email).await? else {
            return Ok(ResendOutcome::Sent);
        };

        if account.email_verified {
            return Ok(ResendOutcome::AlreadyVerified);
        }

        // Overwrite any prior pending secret; the old one dies here even if
        // it had time left
        let ttl = chrono::Duration::from_std(self.config.verification_ttl)
            .map_err(|e| IdentityError::Internal(format!("Invalid verification TTL: {e}")))?;
        let issued = verification::issue(ttl);
        account.begin_verification(issued.pending);
        self.repo.update(&account).await?;

        let link = self.config.verification_link(&issued.raw_secret);
        let body = mailer::verification_email(account.display_name.original(), &link);

        if let Err(e) = self
            .mailer
            .send(account.email.as_str(), mailer::VERIFICATION_SUBJECT, &body)
            .await
        {
            account.clear_verification();
            self.repo.update(&account).await?;
            return Err(IdentityError::EmailDelivery(e.to_string()));
        }

        tracing::info!(account_id = %account.account_id, "Verification email reissued");

        Ok(ResendOutcome::Sent)
    }
}
