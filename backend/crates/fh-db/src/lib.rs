pub mod connection;
pub mod error;
pub mod migration;
pub mod repositories;

pub use connection::database::{connect, run_migrations};
pub use error::{DbError, Result};
pub use migration::schema_migrator::{MigrationOutcome, ReplaySummary, SchemaMigrator};
pub use repositories::account_repository::AccountRepository;
pub use repositories::persistent_login_repository::PersistentLoginRepository;
