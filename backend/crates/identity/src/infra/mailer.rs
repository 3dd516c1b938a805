//! Email Delivery
//!
//! Thin interface over outbound mail. Delivery failures surface to the
//! caller so registration can roll back a just-issued verification token
//! instead of stranding the account with an unreachable pending secret.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

/// Email delivery errors
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Outbound email interface
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    /// Send one HTML email. Fire-and-forget from the domain's point of view,
    /// but errors are surfaced to the caller.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError>;
}

// ============================================================================
// SMTP implementation
// ============================================================================

/// SMTP-backed mailer (TLS relay)
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Connect to an SMTP relay with credentials.
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from: String,
    ) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| MailerError::Transport(e.to_string()))?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();

        Ok(Self { transport, from })
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| MailerError::InvalidAddress(self.from.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| MailerError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| MailerError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailerError::Transport(e.to_string()))
    }
}

// ============================================================================
// In-memory implementation (tests, local runs without a relay)
// ============================================================================

/// A sent message as recorded by [`MemoryMailer`]
#[derive(Debug, Clone)]
pub struct RecordedMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Records messages instead of sending them; optionally fails every send.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: std::sync::Mutex<Vec<RecordedMail>>,
    fail_sends: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails, for delivery-rollback tests.
    pub fn failing() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            fail_sends: true,
        }
    }

    pub fn sent(&self) -> Vec<RecordedMail> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }
}

impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError> {
        if self.fail_sends {
            return Err(MailerError::Transport("simulated relay failure".to_string()));
        }

        self.sent.lock().expect("mailer lock poisoned").push(RecordedMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });

        Ok(())
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Subject line for verification emails
pub const VERIFICATION_SUBJECT: &str = "Verify your email address";

/// Verification email body.
///
/// The link is kept on its own line so plain-text renderings stay clickable.
pub fn verification_email(display_name: &str, link: &str) -> String {
    format!(
        "<p>Hi {display_name},</p>\
         <p>Welcome to Taskline. Confirm your email address to activate your account:</p>\
         <p><a href=\"{link}\">{link}</a></p>\
         <p>The link expires in 10 minutes. If you didn't create this account, you can ignore this email.</p>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_mailer_records() {
        let mailer = MemoryMailer::new();
        Mailer::send(&mailer, "ada@example.com", "Hello", "<p>Hi</p>")
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert_eq!(sent[0].subject, "Hello");
    }

    #[tokio::test]
    async fn test_failing_mailer() {
        let mailer = MemoryMailer::failing();
        let result = Mailer::send(&mailer, "ada@example.com", "Hello", "<p>Hi</p>").await;
        assert!(matches!(result, Err(MailerError::Transport(_))));
        assert!(mailer.sent().is_empty());
    }

    #[test]
    fn test_verification_template_embeds_link() {
        let body = verification_email("Ada", "https://app/auth/verify-email/secret");
        assert!(body.contains("https://app/auth/verify-email/secret"));
        assert!(body.contains("Ada"));
    }
}
