//! Error types shared by the account layer, storage and configuration.

use thiserror::Error;

/// Form-level problems caught before any store is consulted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingField,

    #[error("Please enter a valid email")]
    MalformedEmail,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Please confirm your password")]
    MissingConfirmation,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Failures of the delegated identity provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Federated sign-in is not configured")]
    Unavailable,

    /// The user closed the consent prompt
    #[error("Sign-in was cancelled")]
    Cancelled,

    /// Raw provider text when present, otherwise a generic message
    #[error("{}", failed_message(.0))]
    Failed(String),
}

fn failed_message(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "Federated sign-in failed"
    } else {
        trimmed
    }
}

/// Storage backend failures (credential directory, session snapshot)
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Everything `AccountStore` can report back to the auth screen
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Email already registered")]
    AlreadyRegistered,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} duration must be at least one minute")]
    ZeroDuration(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failure_falls_back_to_generic_text() {
        assert_eq!(
            ProviderError::Failed(String::new()).to_string(),
            "Federated sign-in failed"
        );
        assert_eq!(
            ProviderError::Failed("  popup blocked\n".into()).to_string(),
            "popup blocked"
        );
    }

    #[test]
    fn validation_is_transparent_through_auth_error() {
        let err: AuthError = ValidationError::PasswordMismatch.into();
        assert_eq!(err.to_string(), "Passwords do not match");
    }
}
