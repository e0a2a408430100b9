use crate::{AuthError, Result as AuthErrorResult};

use std::panic::Location;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use error_location::ErrorLocation;
use rand::RngCore;

pub const MIN_PASSWORD_LENGTH: usize = 8;

const SALT_LENGTH: usize = 16;

/// Argon2id PHC string for `password`
#[track_caller]
pub fn hash_password(password: &str) -> AuthErrorResult<String> {
    let mut salt_bytes = [0u8; SALT_LENGTH];
    rand::rng().fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::PasswordHash {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(hash.to_string())
}

/// False for a wrong password and for anything that is not a PHC string
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// At least 8 characters with one letter and one digit; `confirmation` must match
#[track_caller]
pub fn validate_password_policy(password: &str, confirmation: &str) -> AuthErrorResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }

    if !password.chars().any(|c| c.is_alphabetic()) || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(AuthError::validation(
            "password",
            "must contain at least one letter and one digit",
        ));
    }

    if password != confirmation {
        return Err(AuthError::validation(
            "confirm_password",
            "passwords do not match",
        ));
    }

    Ok(())
}
