//! Identity Error Types
//!
//! This module provides identity-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Identity-specific result type alias
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity-specific error variants
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Wrong email or wrong password; never says which
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Correct credentials, but the email address is not verified yet
    #[error("Email address not verified")]
    Unverified,

    /// Verification or session token failed; structural, signature and
    /// expiry failures are indistinguishable on purpose
    #[error("Token is invalid or expired")]
    TokenInvalidOrExpired,

    /// Authenticated but role/membership insufficient
    #[error("Forbidden")]
    Forbidden,

    /// Absent, or present but not disclosed to this caller
    #[error("Not found")]
    NotFound,

    /// Email address already registered
    #[error("Email address already in use")]
    EmailTaken,

    /// Display name already taken (case-insensitive)
    #[error("Display name already in use")]
    DisplayNameTaken,

    /// Rate limit window exceeded
    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    /// Request payload failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Outbound email could not be delivered
    #[error("Email delivery failed: {0}")]
    EmailDelivery(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::InvalidCredentials | IdentityError::TokenInvalidOrExpired => {
                StatusCode::UNAUTHORIZED
            }
            IdentityError::Unverified | IdentityError::Forbidden => StatusCode::FORBIDDEN,
            IdentityError::NotFound => StatusCode::NOT_FOUND,
            IdentityError::EmailTaken | IdentityError::DisplayNameTaken => StatusCode::CONFLICT,
            IdentityError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            IdentityError::Validation(_) => StatusCode::BAD_REQUEST,
            IdentityError::EmailDelivery(_) => StatusCode::SERVICE_UNAVAILABLE,
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::InvalidCredentials | IdentityError::TokenInvalidOrExpired => {
                ErrorKind::Unauthorized
            }
            IdentityError::Unverified | IdentityError::Forbidden => ErrorKind::Forbidden,
            IdentityError::NotFound => ErrorKind::NotFound,
            IdentityError::EmailTaken | IdentityError::DisplayNameTaken => ErrorKind::Conflict,
            IdentityError::RateLimited { .. } => ErrorKind::TooManyRequests,
            IdentityError::Validation(_) => ErrorKind::BadRequest,
            IdentityError::EmailDelivery(_) => ErrorKind::ServiceUnavailable,
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Machine-readable error code carried in the response body.
    ///
    /// Clients branch on this (e.g. offering "resend verification" on
    /// `unverified`), so the codes are part of the API contract.
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::InvalidCredentials => "invalid_credentials",
            IdentityError::Unverified => "unverified",
            IdentityError::TokenInvalidOrExpired => "token_invalid_or_expired",
            IdentityError::Forbidden => "forbidden",
            IdentityError::NotFound => "not_found",
            IdentityError::EmailTaken => "email_taken",
            IdentityError::DisplayNameTaken => "display_name_taken",
            IdentityError::RateLimited { .. } => "rate_limited",
            IdentityError::Validation(_) => "validation_failed",
            IdentityError::EmailDelivery(_) => "email_delivery_failed",
            IdentityError::Database(_) | IdentityError::Internal(_) => "server_error",
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        match self {
            // Internals stay opaque to callers
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                AppError::new(self.kind(), "Internal server error")
            }
            IdentityError::EmailDelivery(_) => {
                AppError::new(self.kind(), "Could not send email").with_action("Try again later")
            }
            IdentityError::RateLimited { retry_after_secs } => {
                AppError::new(self.kind(), "Too many requests")
                    .with_action(format!("Retry after {retry_after_secs} seconds"))
            }
            IdentityError::Unverified => AppError::new(self.kind(), self.to_string())
                .with_action("Verify your email address, or request a new verification link"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            IdentityError::Database(e) => {
                tracing::error!(error = %e, "Identity database error");
            }
            IdentityError::Internal(msg) => {
                tracing::error!(message = %msg, "Identity internal error");
            }
            IdentityError::EmailDelivery(msg) => {
                tracing::error!(message = %msg, "Email delivery failure");
            }
            IdentityError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            IdentityError::RateLimited { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Rate limit exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Identity error");
            }
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        self.log();

        let mut response = self.to_app_error().into_response();
        response
            .headers_mut()
            .insert("X-Error-Code", http::HeaderValue::from_static(self.code()));

        if let IdentityError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = http::HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(http::header::RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<AppError> for IdentityError {
    fn from(err: AppError) -> Self {
        if err.kind() == ErrorKind::BadRequest {
            IdentityError::Validation(err.message().to_string())
        } else {
            IdentityError::Internal(err.to_string())
        }
    }
}
