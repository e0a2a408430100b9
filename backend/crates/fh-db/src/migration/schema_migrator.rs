//! One-time upgrade of the `persistent_logins` table to the shape with a
//! store-assigned identity column and an origin IP column.
//!
//! Runs before the regular migrations and before any login is served. The
//! upgrade is a copy/drop/recreate/replay sequence, so it is written to
//! survive being interrupted at any step:
//!
//! 1. rows are copied into `persistent_logins_backup`
//! 2. the table is dropped and recreated in the current shape
//! 3. every backed-up row is replayed, `ip` defaulting to NULL
//! 4. the backup is dropped once every row has been replayed
//!
//! Steps 2 and 3 share one transaction. A row that cannot be converted to the
//! current shape is logged and skipped instead of failing the replay, and the
//! backup is then kept so it can be repaired. A backup found on a later start
//! is replayed into the current table again and removed once nothing is left
//! behind.

use crate::{DbError, Result as DbErrorResult};

use std::panic::Location;

use chrono::{DateTime, NaiveDateTime};
use error_location::ErrorLocation;
use log::{error, info, warn};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

const TABLE: &str = "persistent_logins";
const BACKUP_TABLE: &str = "persistent_logins_backup";
const IDENTITY_COLUMN: &str = "id";

/// Current shape of the table; kept in sync with the SQL migration
const CREATE_CURRENT_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS persistent_logins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        series TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL,
        token TEXT NOT NULL,
        last_used INTEGER NOT NULL,
        ip TEXT
    )
"#;

/// Legacy deployments stored timestamps as text in one of these layouts
const LEGACY_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Integer timestamps above this are taken to be milliseconds
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// What happened when the migrator ran at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Table absent or already in the current shape
    NotRequired,
    /// Legacy table upgraded; `rows` grants replayed
    Migrated { rows: usize },
    /// Backup from an interrupted earlier run replayed and removed
    Recovered { rows: usize },
    /// Table upgraded, but `skipped` rows could not be converted and the
    /// backup holding them was kept
    Partial { rows: usize, skipped: usize },
    /// Upgrade failed; existing grants may be unusable but logins still work
    Degraded { reason: String },
}

/// Rows written and rows left behind by one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub replayed: usize,
    pub skipped: usize,
}

#[derive(FromRow)]
struct LegacyRow {
    series: Option<String>,
    username: Option<String>,
    token: Option<String>,
    last_used_type: String,
    last_used_int: Option<i64>,
    last_used_text: Option<String>,
}

/// A backed-up row that fits the current shape
struct LegacyGrant<'r> {
    series: &'r str,
    username: &'r str,
    token: &'r str,
    last_used: i64,
}

impl<'r> TryFrom<&'r LegacyRow> for LegacyGrant<'r> {
    type Error = String;

    fn try_from(row: &'r LegacyRow) -> Result<Self, String> {
        Ok(Self {
            series: required(row.series.as_deref(), "series")?,
            username: required(row.username.as_deref(), "username")?,
            token: required(row.token.as_deref(), "token")?,
            last_used: legacy_timestamp(row)?,
        })
    }
}

fn required<'r>(value: Option<&'r str>, column: &str) -> Result<&'r str, String> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format!("{column} is missing"))
}

/// Normalise a legacy `last_used` value to unix seconds
fn legacy_timestamp(row: &LegacyRow) -> Result<i64, String> {
    match row.last_used_type.as_str() {
        "integer" | "real" => row
            .last_used_int
            .map(|value| {
                if value > MILLIS_THRESHOLD {
                    value / 1000
                } else {
                    value
                }
            })
            .ok_or_else(|| "last_used is missing".to_string()),
        "text" => {
            let text = row.last_used_text.as_deref().unwrap_or_default().trim();
            parse_legacy_text(text).ok_or_else(|| format!("unrecognised last_used value '{text}'"))
        }
        "null" => Err("last_used is missing".to_string()),
        other => Err(format!("unsupported last_used storage class '{other}'")),
    }
}

fn parse_legacy_text(text: &str) -> Option<i64> {
    if let Ok(seconds) = text.parse::<i64>() {
        return Some(seconds);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp());
    }

    LEGACY_TIMESTAMP_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(text, format)
            .ok()
            .map(|naive| naive.and_utc().timestamp())
    })
}

pub struct SchemaMigrator {
    pool: SqlitePool,
}

impl SchemaMigrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Startup entry point. Never fails: errors are logged and reported as
    /// [`MigrationOutcome::Degraded`] so the process keeps running.
    pub async fn run(&self) -> MigrationOutcome {
        match self.try_run().await {
            Ok(outcome) => {
                match &outcome {
                    MigrationOutcome::NotRequired => {
                        info!("{TABLE} schema is current, no migration needed")
                    }
                    MigrationOutcome::Migrated { rows } => {
                        info!("{TABLE} schema migrated, {rows} grants preserved")
                    }
                    MigrationOutcome::Recovered { rows } => {
                        info!("{TABLE} recovered from interrupted migration, {rows} grants restored")
                    }
                    MigrationOutcome::Partial { rows, skipped } => {
                        warn!(
                            "{TABLE} schema migrated with {rows} grants, {skipped} unreadable grants left in {BACKUP_TABLE}"
                        )
                    }
                    MigrationOutcome::Degraded { .. } => {}
                }
                outcome
            }
            Err(e) => {
                error!(
                    "{TABLE} migration failed, continuing with degraded remember-me support: {e}"
                );
                MigrationOutcome::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_run(&self) -> DbErrorResult<MigrationOutcome> {
        if self.table_exists(BACKUP_TABLE).await? {
            warn!("Found {BACKUP_TABLE} from an earlier migration");

            if self.needs_migration().await? {
                let summary = self.migrate().await?;
                return Ok(Self::settle(summary, |rows| MigrationOutcome::Migrated { rows }));
            }

            let summary = self.recover_interrupted().await?;
            return Ok(Self::settle(summary, |rows| MigrationOutcome::Recovered { rows }));
        }

        if self.needs_migration().await? {
            let summary = self.migrate().await?;
            return Ok(Self::settle(summary, |rows| MigrationOutcome::Migrated { rows }));
        }

        Ok(MigrationOutcome::NotRequired)
    }

    /// True when the table exists without its identity column. A missing
    /// table needs no migration: the regular migrations create it.
    pub async fn needs_migration(&self) -> DbErrorResult<bool> {
        if !self.table_exists(TABLE).await? {
            return Ok(false);
        }

        Ok(!self.column_exists(TABLE, IDENTITY_COLUMN).await?)
    }

    fn settle(
        summary: ReplaySummary,
        complete: impl FnOnce(usize) -> MigrationOutcome,
    ) -> MigrationOutcome {
        if summary.skipped == 0 {
            complete(summary.replayed)
        } else {
            MigrationOutcome::Partial {
                rows: summary.replayed,
                skipped: summary.skipped,
            }
        }
    }

    /// Upgrade the legacy table.
    ///
    /// Unconvertible rows are skipped and counted. A store failure rolls the
    /// transaction back, leaving both the original table and the backup in
    /// place.
    pub async fn migrate(&self) -> DbErrorResult<ReplaySummary> {
        info!("Step 1: backing up {TABLE} to {BACKUP_TABLE}");
        self.backup().await?;

        let rows = self.load_backup().await?;
        info!("Backed up {} rows", rows.len());

        let mut tx = self.pool.begin().await?;

        info!("Step 2: recreating {TABLE} in current shape");
        sqlx::query(&format!("DROP TABLE IF EXISTS {TABLE}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(CREATE_CURRENT_TABLE).execute(&mut *tx).await?;

        info!("Step 3: replaying backed-up rows");
        let summary = Self::replay(&mut *tx, &rows).await?;

        tx.commit().await?;

        self.finish_backup(&summary).await?;

        Ok(summary)
    }

    /// Replay a leftover backup into the current-shape table. Rows whose
    /// series is already present are left as they are.
    async fn recover_interrupted(&self) -> DbErrorResult<ReplaySummary> {
        let rows = self.load_backup().await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(CREATE_CURRENT_TABLE).execute(&mut *tx).await?;
        let summary = Self::replay(&mut *tx, &rows).await?;
        tx.commit().await?;

        self.finish_backup(&summary).await?;

        Ok(summary)
    }

    async fn finish_backup(&self, summary: &ReplaySummary) -> DbErrorResult<()> {
        if summary.skipped > 0 {
            warn!(
                "Keeping {BACKUP_TABLE}: {} rows could not be replayed",
                summary.skipped
            );
            return Ok(());
        }

        info!("Step 4: dropping {BACKUP_TABLE}");
        self.drop_backup().await
    }

    async fn backup(&self) -> DbErrorResult<()> {
        if self.table_exists(BACKUP_TABLE).await? {
            // Keep what an earlier attempt saved and add anything newer
            sqlx::query(&format!(
                "INSERT INTO {BACKUP_TABLE} SELECT * FROM {TABLE} \
                 WHERE series NOT IN (SELECT series FROM {BACKUP_TABLE} WHERE series IS NOT NULL)"
            ))
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(&format!(
                "CREATE TABLE {BACKUP_TABLE} AS SELECT * FROM {TABLE}"
            ))
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn load_backup(&self) -> DbErrorResult<Vec<LegacyRow>> {
        let rows = sqlx::query_as::<_, LegacyRow>(&format!(
            r#"
              SELECT series, username, token,
                     typeof(last_used) AS last_used_type,
                     CASE WHEN typeof(last_used) IN ('integer', 'real')
                          THEN CAST(last_used AS INTEGER) END AS last_used_int,
                     CASE WHEN typeof(last_used) = 'text'
                          THEN last_used END AS last_used_text
              FROM {BACKUP_TABLE}
              ORDER BY rowid
              "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert every convertible row. A series that is already present keeps
    /// its existing row.
    async fn replay(conn: &mut SqliteConnection, rows: &[LegacyRow]) -> DbErrorResult<ReplaySummary> {
        let total = rows.len();
        let mut summary = ReplaySummary::default();

        for (index, row) in rows.iter().enumerate() {
            let grant = match LegacyGrant::try_from(row) {
                Ok(grant) => grant,
                Err(message) => {
                    let skipped = DbError::MigrationReplay {
                        row: index + 1,
                        total,
                        message,
                        location: ErrorLocation::from(Location::caller()),
                    };
                    warn!("Skipping legacy grant: {skipped}");
                    summary.skipped += 1;
                    continue;
                }
            };

            let result = sqlx::query(
                "INSERT OR IGNORE INTO persistent_logins (series, username, token, last_used, ip) \
                 VALUES (?, ?, ?, ?, NULL)",
            )
            .bind(grant.series)
            .bind(grant.username)
            .bind(grant.token)
            .bind(grant.last_used)
            .execute(&mut *conn)
            .await?;

            summary.replayed += result.rows_affected() as usize;
        }

        Ok(summary)
    }

    async fn drop_backup(&self) -> DbErrorResult<()> {
        sqlx::query(&format!("DROP TABLE IF EXISTS {BACKUP_TABLE}"))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn table_exists(&self, table: &str) -> DbErrorResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    async fn column_exists(&self, table: &str, column: &str) -> DbErrorResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
                .bind(table)
                .bind(column)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }
}
