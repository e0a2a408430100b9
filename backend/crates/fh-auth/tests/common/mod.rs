#![allow(dead_code)]

use fh_auth::{
    AccountRegistrar, AccountStore, AdminDesignation, AuthenticationOutcomeResolver,
    PersistentLoginStore, RememberMeService, RememberMeSettings, TokenCodec,
};
use fh_db::{AccountRepository, PersistentLoginRepository, run_migrations};

use std::sync::Arc;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub const ADMIN_EMAIL: &str = "admin@example.com";

pub struct Services {
    pub pool: SqlitePool,
    pub resolver: AuthenticationOutcomeResolver,
    pub remember_me: RememberMeService,
    pub registrar: AccountRegistrar,
    pub accounts: Arc<AccountRepository>,
    pub tokens: Arc<PersistentLoginRepository>,
}

pub async fn create_test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(":memory:")
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1) // In-memory needs single connection
        .connect_with(options)
        .await
        .expect("Failed to create test pool");

    run_migrations(&pool).await.expect("Failed to run migrations");

    pool
}

pub async fn create_services(settings: RememberMeSettings) -> Services {
    let pool = create_test_pool().await;

    let accounts = Arc::new(AccountRepository::new(pool.clone()));
    let tokens = Arc::new(PersistentLoginRepository::new(pool.clone()));
    let account_store: Arc<dyn AccountStore> = accounts.clone();
    let token_store: Arc<dyn PersistentLoginStore> = tokens.clone();
    let admin = AdminDesignation::new(Some(ADMIN_EMAIL));

    Services {
        resolver: AuthenticationOutcomeResolver::new(
            Arc::clone(&account_store),
            Arc::clone(&token_store),
            TokenCodec::new().expect("entropy available"),
            admin.clone(),
            settings.clone(),
        ),
        remember_me: RememberMeService::new(
            Arc::clone(&account_store),
            Arc::clone(&token_store),
            admin,
            settings,
        ),
        registrar: AccountRegistrar::new(account_store),
        pool,
        accounts,
        tokens,
    }
}

pub async fn account_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await
        .expect("Failed to count accounts")
}

pub async fn grant_count(pool: &SqlitePool, owner: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM persistent_logins WHERE username = ?")
        .bind(owner)
        .fetch_one(pool)
        .await
        .expect("Failed to count grants")
}
