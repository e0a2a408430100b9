//! Startup wiring. The persistent-login schema upgrade runs to completion
//! before the regular migrations and before any service is constructed.

use crate::error::Result as ServerErrorResult;

use fh_auth::{
    AccountAdministration, AccountRegistrar, AccountStore, AdminDesignation,
    AuthenticationOutcomeResolver, PasswordAuthenticator, PersistentLoginStore,
    RememberMeService, RememberMeSettings, SameSite, TokenCodec,
};
use fh_config::{Config, RememberMeConfig, SameSitePolicy};
use fh_db::{
    AccountRepository, MigrationOutcome, PersistentLoginRepository, SchemaMigrator, connect,
    run_migrations,
};

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use log::{info, warn};
use sqlx::SqlitePool;

/// Everything a request handler needs, built once at startup
pub struct App {
    pub pool: SqlitePool,
    pub migration: MigrationOutcome,
    pub admin: AdminDesignation,
    pub accounts: Arc<dyn AccountStore>,
    pub resolver: AuthenticationOutcomeResolver,
    pub remember_me: RememberMeService,
    pub registrar: AccountRegistrar,
    pub authenticator: PasswordAuthenticator,
    pub administration: AccountAdministration,
}

impl App {
    pub async fn build(config: &Config, database_path: &Path) -> ServerErrorResult<Self> {
        // Fails fast when the OS cannot supply randomness
        let codec = TokenCodec::new()?;

        let (pool, migration) =
            prepare_database(database_path, config.database.max_connections).await?;

        let accounts: Arc<dyn AccountStore> = Arc::new(AccountRepository::new(pool.clone()));
        let tokens: Arc<dyn PersistentLoginStore> =
            Arc::new(PersistentLoginRepository::new(pool.clone()));
        let admin = AdminDesignation::new(config.auth.admin_email());
        let settings = remember_me_settings(&config.remember_me);

        if !admin.is_configured() {
            warn!("No administrator email configured, ADMIN will never be granted");
        }

        Ok(Self {
            resolver: AuthenticationOutcomeResolver::new(
                Arc::clone(&accounts),
                Arc::clone(&tokens),
                codec,
                admin.clone(),
                settings.clone(),
            ),
            remember_me: RememberMeService::new(
                Arc::clone(&accounts),
                tokens,
                admin.clone(),
                settings,
            ),
            registrar: AccountRegistrar::new(Arc::clone(&accounts)),
            authenticator: PasswordAuthenticator::new(Arc::clone(&accounts)),
            administration: AccountAdministration::new(Arc::clone(&accounts)),
            accounts,
            admin,
            migration,
            pool,
        })
    }
}

/// Open the database, upgrade a legacy persistent-login table, then apply
/// the SQL migrations. A failed upgrade is reported, not fatal.
pub async fn prepare_database(
    database_path: &Path,
    max_connections: u32,
) -> ServerErrorResult<(SqlitePool, MigrationOutcome)> {
    let pool = connect(database_path, max_connections).await?;

    let migration = SchemaMigrator::new(pool.clone()).run().await;
    match &migration {
        MigrationOutcome::Degraded { reason } => {
            warn!("Remember-me grants may be unavailable until the store is repaired: {reason}");
        }
        MigrationOutcome::Partial { skipped, .. } => {
            warn!("{skipped} remember-me grants need repair before they can be restored");
        }
        _ => {}
    }

    info!("Running database migrations...");
    run_migrations(&pool).await?;
    info!("Migrations complete");

    Ok((pool, migration))
}

/// Convert the config section into the settings the auth services take
pub fn remember_me_settings(config: &RememberMeConfig) -> RememberMeSettings {
    RememberMeSettings {
        enabled: config.enabled,
        local_logins: config.local_logins,
        cookie_name: config.cookie_name.clone(),
        max_age_secs: config.max_age_secs,
        secure: config.secure,
        same_site: match config.same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        },
        expire_after: config
            .expire_after_days
            .map(|days| Duration::days(i64::from(days))),
    }
}
