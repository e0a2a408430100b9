use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// In-memory SQLite pool with no schema at all
pub async fn create_empty_pool() -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(":memory:")
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(1) // In-memory needs single connection
        .connect_with(options)
        .await
        .expect("Failed to create test pool")
}

/// In-memory SQLite pool with migrations run
pub async fn create_test_pool() -> SqlitePool {
    let pool = create_empty_pool().await;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Creates `persistent_logins` in the shape deployments used before the
/// identity and IP columns existed
pub async fn create_legacy_persistent_logins(pool: &SqlitePool) {
    sqlx::query(
        r#"
          CREATE TABLE persistent_logins (
              username VARCHAR(64),
              series VARCHAR(64) PRIMARY KEY,
              token VARCHAR(64),
              last_used TIMESTAMP
          )
          "#,
    )
    .execute(pool)
    .await
    .expect("Failed to create legacy table");
}

/// Inserts a row into the legacy table; `last_used` is bound as given so
/// callers can reproduce integer and text timestamps
pub async fn insert_legacy_row<'a, T>(
    pool: &SqlitePool,
    username: &'a str,
    series: &'a str,
    token: Option<&'a str>,
    last_used: T,
) where
    T: sqlx::Encode<'a, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite> + Send + 'a,
{
    sqlx::query("INSERT INTO persistent_logins (username, series, token, last_used) VALUES (?, ?, ?, ?)")
        .bind(username)
        .bind(series)
        .bind(token)
        .bind(last_used)
        .execute(pool)
        .await
        .expect("Failed to insert legacy row");
}

pub async fn table_exists(pool: &SqlitePool, table: &str) -> bool {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(pool)
            .await
            .expect("Failed to query sqlite_master");

    count > 0
}

pub async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> bool {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
        .bind(table)
        .bind(column)
        .fetch_one(pool)
        .await
        .expect("Failed to query table info");

    count > 0
}

pub async fn row_count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}

pub async fn grant_count(pool: &SqlitePool, owner: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM persistent_logins WHERE username = ?")
        .bind(owner)
        .fetch_one(pool)
        .await
        .expect("Failed to count grants")
}
