use fh_core::{Account, PersistentLoginToken};

use chrono::{DateTime, Utc};

/// Argon2 PHC string shape; the repository never inspects it
pub const TEST_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g";

pub fn create_local_account(username: &str) -> Account {
    Account::local(username, TEST_HASH.to_string())
}

pub fn create_federated_account(username: &str, email: &str) -> Account {
    Account::federated(username, email)
}

/// Whole seconds, matching what the store keeps
pub fn now_seconds() -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp(), 0).expect("valid timestamp")
}

pub fn create_token(owner: &str, series: &str) -> PersistentLoginToken {
    PersistentLoginToken::new(
        owner,
        series.to_string(),
        format!("token-for-{series}"),
        now_seconds(),
    )
}
