use chrono::{DateTime, Utc};

/// One long-lived remember-me grant.
///
/// `token_value` is a secret: `Debug` redacts it and it is never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct PersistentLoginToken {
    /// Store-assigned identity; `None` until persisted
    pub id: Option<i64>,
    pub series: String,
    /// Effective username of the owner at mint time
    pub owner: String,
    pub token_value: String,
    pub last_used: DateTime<Utc>,
    pub origin_ip: Option<String>,
}

impl PersistentLoginToken {
    pub fn new(owner: &str, series: String, token_value: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            series,
            owner: owner.to_string(),
            token_value,
            last_used: issued_at,
            origin_ip: None,
        }
    }

    /// Short, non-secret prefix of the series for log lines
    pub fn series_hint(&self) -> &str {
        series_hint(&self.series)
    }
}

pub fn series_hint(series: &str) -> &str {
    series.get(..6).unwrap_or(series)
}

impl std::fmt::Debug for PersistentLoginToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentLoginToken")
            .field("id", &self.id)
            .field("series", &self.series)
            .field("owner", &self.owner)
            .field("token_value", &"<redacted>")
            .field("last_used", &self.last_used)
            .field("origin_ip", &self.origin_ip)
            .finish()
    }
}
