use crate::{AuthError, Result as AuthErrorResult};

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use http::HeaderValue;

pub const DEFAULT_COOKIE_NAME: &str = "food-history-remember-me";
/// 30 days
pub const DEFAULT_MAX_AGE_SECS: u64 = 2_592_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

impl FromStr for SameSite {
    type Err = AuthError;

    #[track_caller]
    fn from_str(s: &str) -> AuthErrorResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => Err(AuthError::validation(
                "same_site",
                format!("unknown SameSite policy '{other}'"),
            )),
        }
    }
}

/// Remember-me policy handed to the login services at construction
#[derive(Debug, Clone)]
pub struct RememberMeSettings {
    pub enabled: bool,
    /// Whether password logins may mint grants (federated logins always may)
    pub local_logins: bool,
    pub cookie_name: String,
    pub max_age_secs: u64,
    pub secure: bool,
    pub same_site: SameSite,
    /// Reject grants unused for longer than this; `None` disables the check
    pub expire_after: Option<Duration>,
}

impl Default for RememberMeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            local_logins: false,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            secure: false,
            same_site: SameSite::Lax,
            expire_after: None,
        }
    }
}

/// A `Set-Cookie` instruction carrying (or clearing) a remember-me grant
#[derive(Clone, PartialEq, Eq)]
pub struct RememberMeCookie {
    name: String,
    value: String,
    max_age_secs: u64,
    secure: bool,
    same_site: SameSite,
}

impl RememberMeCookie {
    pub fn issue(settings: &RememberMeSettings, value: String) -> Self {
        Self {
            name: settings.cookie_name.clone(),
            value,
            max_age_secs: settings.max_age_secs,
            secure: settings.secure,
            same_site: settings.same_site,
        }
    }

    /// Empty value with `Max-Age=0`, telling the browser to drop the cookie
    pub fn clearing(settings: &RememberMeSettings) -> Self {
        Self {
            name: settings.cookie_name.clone(),
            value: String::new(),
            max_age_secs: 0,
            secure: settings.secure,
            same_site: settings.same_site,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    pub fn is_clearing(&self) -> bool {
        self.max_age_secs == 0
    }

    #[track_caller]
    pub fn to_header_value(&self) -> AuthErrorResult<HeaderValue> {
        HeaderValue::from_str(&self.to_string())
            .map_err(|e| AuthError::validation("cookie", e.to_string()))
    }
}

impl fmt::Display for RememberMeCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite={}",
            self.name,
            self.value,
            self.max_age_secs,
            self.same_site.as_str()
        )?;

        if self.secure {
            write!(f, "; Secure")?;
        }

        Ok(())
    }
}

impl fmt::Debug for RememberMeCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RememberMeCookie")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("max_age_secs", &self.max_age_secs)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .finish()
    }
}
