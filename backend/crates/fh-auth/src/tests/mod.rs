mod remember_me_cookie;

use crate::{AccountStore, PersistentLoginStore};

use fh_core::{Account, PersistentLoginToken};
use fh_db::{DbError, Result as DbErrorResult};

use std::panic::Location;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use uuid::Uuid;

fn store_failure() -> DbError {
    DbError::Initialization {
        message: "injected store failure".to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Account table in memory, counting writes
#[derive(Default)]
pub(crate) struct InMemoryAccountStore {
    accounts: Mutex<Vec<Account>>,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    /// Inserted by the next `create`, which then reports a duplicate email
    racing_account: Mutex<Option<Account>>,
}

impl InMemoryAccountStore {
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            ..Default::default()
        }
    }

    pub fn lose_next_create_to(&self, account: Account) {
        *self.racing_account.lock().unwrap() = Some(account);
    }

    pub fn all(&self) -> Vec<Account> {
        self.accounts.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
    }

    fn read<F>(&self, predicate: F) -> DbErrorResult<Option<Account>>
    where
        F: Fn(&Account) -> bool,
    {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(store_failure());
        }

        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|account| predicate(account))
            .cloned())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> DbErrorResult<Option<Account>> {
        self.read(|account| account.id == id)
    }

    async fn find_by_email(&self, email: &str) -> DbErrorResult<Option<Account>> {
        self.read(|account| {
            account
                .email
                .as_deref()
                .is_some_and(|stored| stored.eq_ignore_ascii_case(email))
        })
    }

    async fn find_by_username(&self, username: &str) -> DbErrorResult<Option<Account>> {
        self.read(|account| account.username == username)
    }

    async fn create(&self, account: &Account) -> DbErrorResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }

        let mut accounts = self.accounts.lock().unwrap();

        if let Some(racer) = self.racing_account.lock().unwrap().take() {
            accounts.push(racer);
        }

        let duplicate = account.email.as_deref().is_some_and(|email| {
            accounts.iter().any(|existing| {
                existing
                    .email
                    .as_deref()
                    .is_some_and(|stored| stored.eq_ignore_ascii_case(email))
            })
        });
        if duplicate {
            return Err(DbError::DuplicateEmail {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        accounts.push(account.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, account: &Account) -> DbErrorResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(store_failure());
        }

        let mut accounts = self.accounts.lock().unwrap();
        let Some(existing) = accounts.iter_mut().find(|existing| existing.id == account.id) else {
            return Err(DbError::NotFound {
                entity: "account",
                key: account.id.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        *existing = account.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Persistent login table in memory with failure injection
#[derive(Default)]
pub(crate) struct InMemoryLoginStore {
    tokens: Mutex<Vec<PersistentLoginToken>>,
    next_id: AtomicI64,
    pub create_attempts: AtomicUsize,
    /// Number of upcoming `create` calls that report a series collision
    pub duplicate_series_failures: AtomicUsize,
    pub fail_creates: AtomicBool,
    pub fail_ip_updates: AtomicBool,
    pub fail_last_used_updates: AtomicBool,
}

impl InMemoryLoginStore {
    pub fn with_tokens(tokens: Vec<PersistentLoginToken>) -> Self {
        Self {
            tokens: Mutex::new(tokens),
            ..Default::default()
        }
    }

    pub fn all(&self) -> Vec<PersistentLoginToken> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn get(&self, series: &str) -> Option<PersistentLoginToken> {
        self.all().into_iter().find(|token| token.series == series)
    }

    pub fn count_for_owner(&self, owner: &str) -> usize {
        self.all()
            .iter()
            .filter(|token| token.owner == owner)
            .count()
    }

    fn modify<F>(&self, series: &str, change: F) -> DbErrorResult<()>
    where
        F: FnOnce(&mut PersistentLoginToken),
    {
        let mut tokens = self.tokens.lock().unwrap();
        let Some(token) = tokens.iter_mut().find(|token| token.series == series) else {
            return Err(DbError::NotFound {
                entity: "persistent login",
                key: series.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        change(token);
        Ok(())
    }
}

#[async_trait]
impl PersistentLoginStore for InMemoryLoginStore {
    async fn create(&self, token: &PersistentLoginToken) -> DbErrorResult<i64> {
        self.create_attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(store_failure());
        }

        let pending = self.duplicate_series_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.duplicate_series_failures
                .store(pending - 1, Ordering::SeqCst);
            return Err(DbError::DuplicateSeries {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut tokens = self.tokens.lock().unwrap();
        if tokens.iter().any(|existing| existing.series == token.series) {
            return Err(DbError::DuplicateSeries {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut stored = token.clone();
        stored.id = Some(id);
        tokens.push(stored);

        Ok(id)
    }

    async fn find_by_series(&self, series: &str) -> DbErrorResult<Option<PersistentLoginToken>> {
        Ok(self.get(series))
    }

    async fn update_origin_ip(&self, series: &str, ip: &str) -> DbErrorResult<()> {
        if self.fail_ip_updates.load(Ordering::SeqCst) {
            return Err(store_failure());
        }

        self.modify(series, |token| token.origin_ip = Some(ip.to_string()))
    }

    async fn update_last_used(&self, series: &str, last_used: DateTime<Utc>) -> DbErrorResult<()> {
        if self.fail_last_used_updates.load(Ordering::SeqCst) {
            return Err(store_failure());
        }

        self.modify(series, |token| token.last_used = last_used)
    }

    async fn delete_for_owner(&self, owner: &str) -> DbErrorResult<u64> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|token| token.owner != owner);
        Ok((before - tokens.len()) as u64)
    }
}
