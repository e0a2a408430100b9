use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_REMEMBER_ME_COOKIE_NAME, DEFAULT_REMEMBER_ME_ENABLED,
    DEFAULT_REMEMBER_ME_LOCAL_LOGINS, DEFAULT_REMEMBER_ME_MAX_AGE_SECS, DEFAULT_REMEMBER_ME_SECURE,
};

use std::str::FromStr;

use serde::Deserialize;

/// `SameSite` attribute for the remember-me cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

impl FromStr for SameSitePolicy {
    type Err = ConfigError;

    #[track_caller]
    fn from_str(s: &str) -> ConfigErrorResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => Err(ConfigError::remember_me(format!(
                "remember_me.same_site must be strict, lax or none (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RememberMeConfig {
    pub enabled: bool,
    /// Also mint grants for password logins, not only federated ones
    pub local_logins: bool,
    pub cookie_name: String,
    pub max_age_secs: u64,
    pub secure: bool,
    pub same_site: SameSitePolicy,
    /// Reject grants unused for this many days. Unset keeps grants valid for
    /// as long as the browser presents the cookie.
    pub expire_after_days: Option<u32>,
}

impl Default for RememberMeConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_REMEMBER_ME_ENABLED,
            local_logins: DEFAULT_REMEMBER_ME_LOCAL_LOGINS,
            cookie_name: String::from(DEFAULT_REMEMBER_ME_COOKIE_NAME),
            max_age_secs: DEFAULT_REMEMBER_ME_MAX_AGE_SECS,
            secure: DEFAULT_REMEMBER_ME_SECURE,
            same_site: SameSitePolicy::default(),
            expire_after_days: None,
        }
    }
}

impl RememberMeConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.cookie_name.is_empty() {
            return Err(ConfigError::remember_me(
                "remember_me.cookie_name cannot be empty",
            ));
        }

        // RFC 6265 token characters only
        let invalid = self.cookie_name.chars().any(|c| {
            !c.is_ascii() || c.is_ascii_control() || c == ' ' || "()<>@,;:\\\"/[]?={}".contains(c)
        });
        if invalid {
            return Err(ConfigError::remember_me(format!(
                "remember_me.cookie_name '{}' contains characters not allowed in a cookie name",
                self.cookie_name
            )));
        }

        if self.max_age_secs == 0 {
            return Err(ConfigError::remember_me(
                "remember_me.max_age_secs must be greater than 0",
            ));
        }

        if self.expire_after_days == Some(0) {
            return Err(ConfigError::remember_me(
                "remember_me.expire_after_days must be at least 1 when set",
            ));
        }

        if self.same_site == SameSitePolicy::None && !self.secure {
            return Err(ConfigError::remember_me(
                "remember_me.same_site = \"none\" requires remember_me.secure = true",
            ));
        }

        Ok(())
    }
}
