use crate::bootstrap::{App, prepare_database};
use crate::error::{Result as ServerErrorResult, ServerError};

use fh_auth::{AccountStore, hash_password};
use fh_config::Config;
use fh_db::MigrationOutcome;

use std::io::BufRead;

use clap::Subcommand;
use log::info;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum Commands {
    /// Upgrade the database schema and exit
    Migrate,

    /// Read a password from stdin and print its Argon2 hash
    HashPassword,

    /// Register a local account; reads the password and its confirmation
    /// from stdin, one per line
    Register {
        /// Username (also the display name)
        username: String,
    },

    /// Mark an account as authorized
    Authorize {
        /// Username or email of the acting administrator
        #[arg(long)]
        actor: String,

        /// Id of the account to authorize
        account_id: Uuid,
    },
}

/// Run one command; the returned line is printed to stdout
pub async fn execute(
    command: Commands,
    config: &Config,
    input: &mut impl BufRead,
) -> ServerErrorResult<String> {
    let database_path = config.database_path()?;

    match command {
        Commands::Migrate => {
            let (_, outcome) =
                prepare_database(&database_path, config.database.max_connections).await?;
            Ok(describe_migration(&outcome))
        }
        Commands::HashPassword => {
            let password = read_line(input, "password")?;
            Ok(hash_password(&password)?)
        }
        Commands::Register { username } => {
            let password = read_line(input, "password")?;
            let confirmation = read_line(input, "password confirmation")?;

            let app = App::build(config, &database_path).await?;
            let account = app
                .registrar
                .register(&username, &password, &confirmation)
                .await?;

            Ok(format!("Registered {} ({})", account.username, account.id))
        }
        Commands::Authorize { actor, account_id } => {
            let app = App::build(config, &database_path).await?;

            let actor_account = app.accounts.find_by_login(&actor).await?.ok_or_else(|| {
                ServerError::InvalidInput {
                    message: format!("No account for actor '{actor}'"),
                }
            })?;
            let authorities = app.admin.authorities_for(&actor_account);
            info!("Authorize requested by {} ({})", actor_account.id, authorities);

            let account = app
                .administration
                .authorize(&authorities, account_id)
                .await?;

            Ok(format!("Authorized {} ({})", account.username, account.id))
        }
    }
}

pub fn describe_migration(outcome: &MigrationOutcome) -> String {
    match outcome {
        MigrationOutcome::NotRequired => "Schema is current".to_string(),
        MigrationOutcome::Migrated { rows } => {
            format!("Migrated persistent logins, {rows} grants preserved")
        }
        MigrationOutcome::Recovered { rows } => {
            format!("Recovered interrupted migration, {rows} grants restored")
        }
        MigrationOutcome::Partial { rows, skipped } => {
            format!("Migrated persistent logins, {rows} grants preserved, {skipped} unreadable grants kept in backup")
        }
        MigrationOutcome::Degraded { reason } => {
            format!("Migration failed, backup retained: {reason}")
        }
    }
}

/// One line without its terminator; an empty line is rejected
pub fn read_line(input: &mut impl BufRead, what: &'static str) -> ServerErrorResult<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|source| ServerError::Stdin { what, source })?;

    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if line.is_empty() {
        return Err(ServerError::InvalidInput {
            message: format!("No {what} given on stdin"),
        });
    }

    Ok(line)
}
