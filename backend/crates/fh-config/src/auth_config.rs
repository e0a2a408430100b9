use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Accounts holding this email are granted ADMIN for the session
    pub admin_email: Option<String>,
}

impl AuthConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if let Some(email) = self.admin_email() {
            let well_formed = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

            if !well_formed {
                return Err(ConfigError::auth(format!(
                    "auth.admin_email '{email}' is not an email address"
                )));
            }
        }

        Ok(())
    }

    /// Admin email with surrounding whitespace removed; blank counts as unset
    pub fn admin_email(&self) -> Option<&str> {
        self.admin_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}
