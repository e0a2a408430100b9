mod auth_config;
mod config;
mod database_config;
mod error;
mod log_level;
mod logging_config;
mod remember_me_config;

pub use auth_config::AuthConfig;
pub use config::Config;
pub use database_config::DatabaseConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use remember_me_config::{RememberMeConfig, SameSitePolicy};

const CONFIG_DIR_ENV: &str = "FH_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".food-history";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_DATABASE_FILENAME: &str = "food-history.db";
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

const DEFAULT_REMEMBER_ME_ENABLED: bool = true;
const DEFAULT_REMEMBER_ME_LOCAL_LOGINS: bool = false;
const DEFAULT_REMEMBER_ME_COOKIE_NAME: &str = "food-history-remember-me";
const DEFAULT_REMEMBER_ME_MAX_AGE_SECS: u64 = 2_592_000; // 30 days
const DEFAULT_REMEMBER_ME_SECURE: bool = false;

const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_COLORED: bool = true;

#[cfg(test)]
mod tests;
