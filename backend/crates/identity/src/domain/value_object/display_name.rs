//! Display Name Value Object
//!
//! Carries the original user-entered name plus a lowercase canonical form.
//! The canonical form backs the case-insensitive uniqueness check against
//! all other accounts.

use kernel::error::app_error::{AppError, AppResult};

/// Maximum display name length in characters
const DISPLAY_NAME_MAX_LENGTH: usize = 50;

/// Display name value object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName {
    original: String,
    canonical: String,
}

impl DisplayName {
    /// Create a new display name with validation
    pub fn new(raw: impl Into<String>) -> AppResult<Self> {
        let original = raw.into().trim().to_string();

        if original.is_empty() {
            return Err(AppError::bad_request("Display name cannot be empty"));
        }

        let char_count = original.chars().count();
        if char_count > DISPLAY_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Display name must be at most {} characters",
                DISPLAY_NAME_MAX_LENGTH
            )));
        }

        if original.chars().any(|c| c.is_control()) {
            return Err(AppError::bad_request(
                "Display name contains invalid characters",
            ));
        }

        let canonical = original.to_lowercase();

        Ok(Self {
            original,
            canonical,
        })
    }

    /// Create from database values (assumed already validated)
    pub fn from_db(original: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            canonical: canonical.into(),
        }
    }

    /// The name as the user entered it
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Lowercase form used for uniqueness comparison
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.original)
    }
}
