use fh_db::DbError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Federated identity did not assert an email address {location}")]
    MissingEmail { location: ErrorLocation },

    #[error("No account for '{identity}' {location}")]
    AccountNotFound {
        identity: String,
        location: ErrorLocation,
    },

    #[error("Account '{identity}' is disabled {location}")]
    AccountDisabled {
        identity: String,
        location: ErrorLocation,
    },

    #[error("Invalid username or password {location}")]
    InvalidCredentials { location: ErrorLocation },

    #[error("Identity reconciliation failed: {source} {location}")]
    ReconciliationFailed {
        #[source]
        source: DbError,
        location: ErrorLocation,
    },

    #[error("Persistent login series already exists {location}")]
    DuplicateSeries { location: ErrorLocation },

    #[error("Remember-me token issuance failed: {message} {location}")]
    TokenIssuanceFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Malformed remember-me cookie: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Store error: {source} {location}")]
    Store {
        #[source]
        source: DbError,
        location: ErrorLocation,
    },

    #[error("Secure random source unavailable: {message} {location}")]
    EntropyUnavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Password hashing failed: {message} {location}")]
    PasswordHash {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid {field}: {message} {location}")]
    Validation {
        field: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("Username '{username}' is already taken {location}")]
    UsernameTaken {
        username: String,
        location: ErrorLocation,
    },

    #[error("Forbidden: {message} {location}")]
    Forbidden {
        message: String,
        location: ErrorLocation,
    },
}

impl AuthError {
    #[track_caller]
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn invalid_credentials() -> Self {
        Self::InvalidCredentials {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Stable machine-readable code for responses and log correlation
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingEmail { .. } => "MISSING_EMAIL",
            Self::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            Self::AccountDisabled { .. } => "ACCOUNT_DISABLED",
            Self::InvalidCredentials { .. } => "INVALID_CREDENTIALS",
            Self::ReconciliationFailed { .. } => "RECONCILIATION_FAILED",
            Self::DuplicateSeries { .. } => "DUPLICATE_SERIES",
            Self::TokenIssuanceFailed { .. } => "TOKEN_ISSUANCE_FAILED",
            Self::Decode { .. } => "DECODE_ERROR",
            Self::Store { .. } => "STORE_ERROR",
            Self::EntropyUnavailable { .. } => "ENTROPY_UNAVAILABLE",
            Self::PasswordHash { .. } => "PASSWORD_HASH_FAILED",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::UsernameTaken { .. } => "USERNAME_TAKEN",
            Self::Forbidden { .. } => "FORBIDDEN",
        }
    }

    /// Whether repeating the operation with fresh input can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DuplicateSeries { .. })
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(*field),
            Self::UsernameTaken { .. } => Some("username"),
            _ => None,
        }
    }
}

impl From<DbError> for AuthError {
    #[track_caller]
    fn from(source: DbError) -> Self {
        match source {
            DbError::DuplicateSeries { location } => Self::DuplicateSeries { location },
            source => Self::Store {
                source,
                location: ErrorLocation::from(Location::caller()),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
