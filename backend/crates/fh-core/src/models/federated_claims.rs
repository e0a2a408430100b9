use serde::{Deserialize, Serialize};

/// Claims asserted by an external identity provider after a successful
/// OpenID Connect style login. Resolved once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedClaims {
    /// Provider subject identifier
    pub subject: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Offline refresh token, when the provider issued one
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<String>,
}

impl FederatedClaims {
    pub fn new(subject: &str, email: Option<&str>, name: Option<&str>) -> Self {
        Self {
            subject: subject.to_string(),
            email: email.map(str::to_string),
            name: name.map(str::to_string),
            refresh_token: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: &str) -> Self {
        self.refresh_token = Some(refresh_token.to_string());
        self
    }

    /// Trimmed email, `None` when absent or blank
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// Trimmed display name, `None` when absent or blank
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Display name to use for a new account: the asserted name, or the local
    /// part of the email when the provider supplied none or an email-shaped one.
    pub fn display_name_or_email_local_part(&self) -> Option<String> {
        if let Some(name) = self.display_name()
            && !name.contains('@')
        {
            return Some(name.to_string());
        }

        self.email().map(|email| match email.split_once('@') {
            Some((local, _)) if !local.is_empty() => local.to_string(),
            _ => email.to_string(),
        })
    }
}
