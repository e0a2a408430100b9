//! Random token material and the remember-me cookie payload.
//!
//! Cookie value: `base64(series ":" token_value)`, where `series` and
//! `token_value` are themselves base64 of 16 random bytes.

use crate::{AuthError, Result as AuthErrorResult};

use std::panic::Location;

use base64::Engine;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use error_location::ErrorLocation;
use rand::rngs::OsRng;
use rand::{RngCore, TryRngCore};

/// Raw bytes behind each series and token value
pub const TOKEN_LENGTH: usize = 16;

const COOKIE_DELIMITER: char = ':';

/// Browsers and proxies sometimes strip trailing `=`; accept either form
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Only obtainable through [`TokenCodec::new`], so holding one means the
/// entropy source was available at startup.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TokenCodec;

impl TokenCodec {
    /// Confirms the OS random source works. Call once at startup: a failure
    /// here is fatal, after which generation cannot fail.
    #[track_caller]
    pub fn new() -> AuthErrorResult<Self> {
        let mut sample = [0u8; TOKEN_LENGTH];
        OsRng
            .try_fill_bytes(&mut sample)
            .map_err(|e| AuthError::EntropyUnavailable {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self)
    }

    /// 16 random bytes, base64 encoded (24 characters)
    pub fn generate_random_token(&self) -> String {
        let mut bytes = [0u8; TOKEN_LENGTH];
        rand::rng().fill_bytes(&mut bytes);
        STANDARD.encode(bytes)
    }

    /// Neither part may contain `:`; generated material never does.
    pub fn encode_cookie(series: &str, token_value: &str) -> String {
        STANDARD.encode(format!("{series}{COOKIE_DELIMITER}{token_value}"))
    }

    /// Inverse of [`TokenCodec::encode_cookie`]. Callers treat any error as
    /// "no cookie presented".
    #[track_caller]
    pub fn decode_cookie(raw: &str) -> AuthErrorResult<(String, String)> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AuthError::decode("cookie value is empty"));
        }

        let bytes = LENIENT
            .decode(raw)
            .map_err(|e| AuthError::decode(format!("not valid base64: {e}")))?;
        let decoded =
            String::from_utf8(bytes).map_err(|_| AuthError::decode("payload is not UTF-8"))?;

        let parts: Vec<&str> = decoded.split(COOKIE_DELIMITER).collect();
        let [series, token_value] = parts.as_slice() else {
            return Err(AuthError::decode(format!(
                "expected 2 parts, found {}",
                parts.len()
            )));
        };

        if series.is_empty() || token_value.is_empty() {
            return Err(AuthError::decode("empty series or token"));
        }

        if decoded.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(AuthError::decode("payload contains whitespace or control characters"));
        }

        Ok((series.to_string(), token_value.to_string()))
    }
}
