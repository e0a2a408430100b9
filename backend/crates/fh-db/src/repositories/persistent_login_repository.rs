use crate::error::is_unique_violation;
use crate::{DbError, Result as DbErrorResult};

use fh_core::PersistentLoginToken;

use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use sqlx::{FromRow, SqlitePool};

const ENTITY: &str = "persistent login";

#[derive(FromRow)]
struct PersistentLoginRow {
    id: i64,
    series: String,
    username: String,
    token: String,
    last_used: i64,
    ip: Option<String>,
}

impl TryFrom<PersistentLoginRow> for PersistentLoginToken {
    type Error = DbError;

    fn try_from(row: PersistentLoginRow) -> DbErrorResult<Self> {
        let last_used = DateTime::from_timestamp(row.last_used, 0).ok_or_else(|| {
            DbError::corrupt(ENTITY, format!("invalid last_used for id {}", row.id))
        })?;

        Ok(PersistentLoginToken {
            id: Some(row.id),
            series: row.series,
            owner: row.username,
            token_value: row.token,
            last_used,
            origin_ip: row.ip,
        })
    }
}

/// Remember-me grants keyed by series
pub struct PersistentLoginRepository {
    pool: SqlitePool,
}

impl PersistentLoginRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new grant and return its store-assigned id.
    /// Never overwrites: an existing series yields `DbError::DuplicateSeries`.
    pub async fn create(&self, token: &PersistentLoginToken) -> DbErrorResult<i64> {
        let result = sqlx::query(
            r#"
              INSERT INTO persistent_logins (series, username, token, last_used, ip)
              VALUES (?, ?, ?, ?, ?)
              "#,
        )
        .bind(&token.series)
        .bind(&token.owner)
        .bind(&token.token_value)
        .bind(token.last_used.timestamp())
        .bind(&token.origin_ip)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::DuplicateSeries {
                    location: ErrorLocation::from(Location::caller()),
                }
            } else {
                DbError::from(e)
            }
        })?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_series(&self, series: &str) -> DbErrorResult<Option<PersistentLoginToken>> {
        let row = sqlx::query_as::<_, PersistentLoginRow>(
            r#"
              SELECT id, series, username, token, last_used, ip
              FROM persistent_logins
              WHERE series = ?
              "#,
        )
        .bind(series)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PersistentLoginToken::try_from).transpose()
    }

    pub async fn update_origin_ip(&self, series: &str, ip: &str) -> DbErrorResult<()> {
        let result = sqlx::query("UPDATE persistent_logins SET ip = ? WHERE series = ?")
            .bind(ip)
            .bind(series)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(ENTITY, series));
        }

        Ok(())
    }

    pub async fn update_last_used(&self, series: &str, last_used: DateTime<Utc>) -> DbErrorResult<()> {
        let result = sqlx::query("UPDATE persistent_logins SET last_used = ? WHERE series = ?")
            .bind(last_used.timestamp())
            .bind(series)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(ENTITY, series));
        }

        Ok(())
    }

    /// Revoke every grant owned by `owner`; returns how many were removed
    pub async fn delete_for_owner(&self, owner: &str) -> DbErrorResult<u64> {
        let result = sqlx::query("DELETE FROM persistent_logins WHERE username = ?")
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
