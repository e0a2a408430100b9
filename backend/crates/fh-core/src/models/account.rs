use crate::{CoreError, Result as CoreErrorResult, Role, RoleSet};

use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_USERNAME_LENGTH: usize = 50;

/// A person who can sign in, locally, through a federated provider, or both.
///
/// `username` is both the display name and the local login handle. `email` is
/// unique across accounts when present and is the key federated identities are
/// reconciled on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    /// Argon2 PHC string; `None` for federation-only accounts
    #[serde(skip_serializing)]
    pub credential_hash: Option<String>,
    pub roles: RoleSet,
    pub enabled: bool,
    pub federation_authorized: bool,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Account created by local registration
    pub fn local(username: &str, credential_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: None,
            credential_hash: Some(credential_hash),
            roles: RoleSet::user(),
            enabled: true,
            federation_authorized: false,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Account created on the first federated login for an unseen email
    pub fn federated(username: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: Some(email.to_string()),
            credential_hash: None,
            roles: RoleSet::user(),
            enabled: true,
            federation_authorized: true,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_local_credential(&self) -> bool {
        self.credential_hash
            .as_deref()
            .is_some_and(|hash| !hash.is_empty())
    }

    /// The string that identifies this principal across login paths.
    ///
    /// Federation-only accounts are correlated by email, everyone else by
    /// username, so remember-me grants resolve the same way regardless of how
    /// the user originally signed in.
    pub fn effective_username(&self) -> &str {
        match self.email.as_deref() {
            Some(email) if !self.has_local_credential() && !email.is_empty() => email,
            _ => &self.username,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    /// Username rules for locally registered accounts
    #[track_caller]
    pub fn validate_username(username: &str) -> CoreErrorResult<()> {
        let trimmed = username.trim();

        if trimmed.is_empty() {
            return Err(CoreError::Validation {
                message: "Username is required".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if trimmed.chars().count() > MAX_USERNAME_LENGTH {
            return Err(CoreError::Validation {
                message: format!("Username cannot exceed {MAX_USERNAME_LENGTH} characters"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if trimmed.chars().any(char::is_control) {
            return Err(CoreError::Validation {
                message: "Username cannot contain control characters".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if !Self::is_usable_username(trimmed) {
            return Err(CoreError::Validation {
                message: "Username cannot contain '@'".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }

    /// Remember-me grants of federation-only accounts are owned by the email,
    /// so a username must never be mistakable for one.
    pub fn is_usable_username(username: &str) -> bool {
        !username.contains('@')
    }
}
