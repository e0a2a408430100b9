use crate::error::is_unique_violation;
use crate::{DbError, Result as DbErrorResult};

use fh_core::{Account, RoleSet};

use std::panic::Location;
use std::str::FromStr;

use chrono::DateTime;
use error_location::ErrorLocation;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

const ENTITY: &str = "account";

const SELECT_ACCOUNT: &str = r#"
    SELECT id, username, email, credential_hash, roles, enabled,
           federation_authorized, refresh_token, created_at, updated_at
    FROM accounts
"#;

#[derive(FromRow)]
struct AccountRow {
    id: String,
    username: String,
    email: Option<String>,
    credential_hash: Option<String>,
    roles: String,
    enabled: bool,
    federation_authorized: bool,
    refresh_token: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AccountRow> for Account {
    type Error = DbError;

    fn try_from(row: AccountRow) -> DbErrorResult<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| DbError::corrupt(ENTITY, format!("invalid id '{}': {}", row.id, e)))?;
        let roles = RoleSet::from_str(&row.roles)
            .map_err(|e| DbError::corrupt(ENTITY, format!("invalid roles for {id}: {e}")))?;
        let created_at = DateTime::from_timestamp(row.created_at, 0)
            .ok_or_else(|| DbError::corrupt(ENTITY, format!("invalid created_at for {id}")))?;
        let updated_at = DateTime::from_timestamp(row.updated_at, 0)
            .ok_or_else(|| DbError::corrupt(ENTITY, format!("invalid updated_at for {id}")))?;

        Ok(Account {
            id,
            username: row.username,
            email: row.email,
            credential_hash: row.credential_hash.filter(|hash| !hash.is_empty()),
            roles,
            enabled: row.enabled,
            federation_authorized: row.federation_authorized,
            refresh_token: row.refresh_token,
            created_at,
            updated_at,
        })
    }
}

pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, account: &Account) -> DbErrorResult<()> {
        sqlx::query(
            r#"
              INSERT INTO accounts (
                  id, username, email, credential_hash, roles, enabled,
                  federation_authorized, refresh_token, created_at, updated_at
              ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
              "#,
        )
        .bind(account.id.to_string())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.credential_hash)
        .bind(account.roles.to_db_string())
        .bind(account.enabled)
        .bind(account.federation_authorized)
        .bind(&account.refresh_token)
        .bind(account.created_at.timestamp())
        .bind(account.updated_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        Ok(())
    }

    /// Overwrites every mutable column of an existing account
    pub async fn update(&self, account: &Account) -> DbErrorResult<()> {
        let id = account.id.to_string();

        let result = sqlx::query(
            r#"
              UPDATE accounts
              SET username = ?, email = ?, credential_hash = ?, roles = ?, enabled = ?,
                  federation_authorized = ?, refresh_token = ?, updated_at = ?
              WHERE id = ?
              "#,
        )
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.credential_hash)
        .bind(account.roles.to_db_string())
        .bind(account.enabled)
        .bind(account.federation_authorized)
        .bind(&account.refresh_token)
        .bind(account.updated_at.timestamp())
        .bind(&id)
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(ENTITY, id));
        }

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbErrorResult<Option<Account>> {
        let sql = format!("{SELECT_ACCOUNT} WHERE id = ?");

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Account::try_from).transpose()
    }

    /// Case-insensitive, the column is declared `COLLATE NOCASE`
    pub async fn find_by_email(&self, email: &str) -> DbErrorResult<Option<Account>> {
        let sql = format!("{SELECT_ACCOUNT} WHERE email = ?");

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Account::try_from).transpose()
    }

    /// Usernames double as display names and are not unique. When several
    /// accounts share one, the oldest account holding a local credential wins.
    pub async fn find_by_username(&self, username: &str) -> DbErrorResult<Option<Account>> {
        let sql = format!(
            r#"{SELECT_ACCOUNT}
              WHERE username = ?
              ORDER BY (credential_hash IS NULL OR credential_hash = '') ASC, created_at ASC
              LIMIT 1"#
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Account::try_from).transpose()
    }

    #[track_caller]
    fn map_write_error(err: sqlx::Error) -> DbError {
        if is_unique_violation(&err) {
            DbError::DuplicateEmail {
                location: ErrorLocation::from(Location::caller()),
            }
        } else {
            DbError::from(err)
        }
    }
}
