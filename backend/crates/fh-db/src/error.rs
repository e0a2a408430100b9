use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLx error: {source} {location}")]
    Sqlx {
        source: sqlx::Error,
        location: ErrorLocation,
    },

    #[error("Migration error: {message} {location}")]
    Migration {
        message: String,
        location: ErrorLocation,
    },

    #[error("Cannot replay legacy row {row} of {total}: {message} {location}")]
    MigrationReplay {
        row: usize,
        total: usize,
        message: String,
        location: ErrorLocation,
    },

    #[error("Database initialization failed: {message} {location}")]
    Initialization {
        message: String,
        location: ErrorLocation,
    },

    #[error("An account with this email already exists {location}")]
    DuplicateEmail { location: ErrorLocation },

    #[error("A persistent login with this series already exists {location}")]
    DuplicateSeries { location: ErrorLocation },

    #[error("{entity} not found: {key} {location}")]
    NotFound {
        entity: &'static str,
        key: String,
        location: ErrorLocation,
    },

    #[error("Corrupt {entity} row: {message} {location}")]
    CorruptRow {
        entity: &'static str,
        message: String,
        location: ErrorLocation,
    },
}

impl DbError {
    #[track_caller]
    pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn corrupt(entity: &'static str, message: impl Into<String>) -> Self {
        Self::CorruptRow {
            entity,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<sqlx::Error> for DbError {
    #[track_caller]
    fn from(source: sqlx::Error) -> Self {
        Self::Sqlx {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// True when the statement was rejected by a UNIQUE constraint
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub type Result<T> = std::result::Result<T, DbError>;
