//! Persistence seams for the authentication services.
//!
//! The SQLite repositories implement these directly; tests substitute
//! in-memory stores with failure injection.

use fh_core::{Account, PersistentLoginToken};
use fh_db::{AccountRepository, PersistentLoginRepository, Result as DbErrorResult};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DbErrorResult<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> DbErrorResult<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> DbErrorResult<Option<Account>>;

    /// Fails with `DbError::DuplicateEmail` when the email is already held
    async fn create(&self, account: &Account) -> DbErrorResult<()>;

    async fn update(&self, account: &Account) -> DbErrorResult<()>;

    /// Username first, then email
    async fn find_by_login(&self, login: &str) -> DbErrorResult<Option<Account>> {
        if let Some(account) = self.find_by_username(login).await? {
            return Ok(Some(account));
        }

        self.find_by_email(login).await
    }

    /// The account a remember-me grant belongs to.
    ///
    /// Grants are owned by the effective username: the email for
    /// federation-only accounts, the username otherwise. Email-shaped owners
    /// are resolved by email alone, and the match must still have `owner` as
    /// its effective username.
    async fn find_by_owner(&self, owner: &str) -> DbErrorResult<Option<Account>> {
        let account = if owner.contains('@') {
            self.find_by_email(owner).await?
        } else {
            self.find_by_username(owner).await?
        };

        Ok(account.filter(|account| account.effective_username().eq_ignore_ascii_case(owner)))
    }
}

#[async_trait]
pub trait PersistentLoginStore: Send + Sync {
    /// Never overwrites; fails with `DbError::DuplicateSeries`
    async fn create(&self, token: &PersistentLoginToken) -> DbErrorResult<i64>;

    async fn find_by_series(&self, series: &str) -> DbErrorResult<Option<PersistentLoginToken>>;

    async fn update_origin_ip(&self, series: &str, ip: &str) -> DbErrorResult<()>;

    async fn update_last_used(&self, series: &str, last_used: DateTime<Utc>) -> DbErrorResult<()>;

    async fn delete_for_owner(&self, owner: &str) -> DbErrorResult<u64>;
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn find_by_id(&self, id: Uuid) -> DbErrorResult<Option<Account>> {
        AccountRepository::find_by_id(self, id).await
    }

    async fn find_by_email(&self, email: &str) -> DbErrorResult<Option<Account>> {
        AccountRepository::find_by_email(self, email).await
    }

    async fn find_by_username(&self, username: &str) -> DbErrorResult<Option<Account>> {
        AccountRepository::find_by_username(self, username).await
    }

    async fn create(&self, account: &Account) -> DbErrorResult<()> {
        AccountRepository::create(self, account).await
    }

    async fn update(&self, account: &Account) -> DbErrorResult<()> {
        AccountRepository::update(self, account).await
    }
}

#[async_trait]
impl PersistentLoginStore for PersistentLoginRepository {
    async fn create(&self, token: &PersistentLoginToken) -> DbErrorResult<i64> {
        PersistentLoginRepository::create(self, token).await
    }

    async fn find_by_series(&self, series: &str) -> DbErrorResult<Option<PersistentLoginToken>> {
        PersistentLoginRepository::find_by_series(self, series).await
    }

    async fn update_origin_ip(&self, series: &str, ip: &str) -> DbErrorResult<()> {
        PersistentLoginRepository::update_origin_ip(self, series, ip).await
    }

    async fn update_last_used(&self, series: &str, last_used: DateTime<Utc>) -> DbErrorResult<()> {
        PersistentLoginRepository::update_last_used(self, series, last_used).await
    }

    async fn delete_for_owner(&self, owner: &str) -> DbErrorResult<u64> {
        PersistentLoginRepository::delete_for_owner(self, owner).await
    }
}
