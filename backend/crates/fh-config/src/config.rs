use crate::{
    AuthConfig, CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult,
    DEFAULT_CONFIG_DIR, DatabaseConfig, LoggingConfig, RememberMeConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

/// Legacy variable the administrator designation used to be read from
const LEGACY_ADMIN_EMAIL_ENV: &str = "ADMIN_EMAIL";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub remember_me: RememberMeConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for FH_CONFIG_DIR env var, else use ./.food-history/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply FH_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Priority: FH_CONFIG_DIR env var > ./.food-history/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.database.validate()?;
        self.auth.validate()?;
        self.remember_me.validate()?;

        Ok(())
    }

    /// Get absolute path to database file.
    pub fn database_path(&self) -> ConfigErrorResult<PathBuf> {
        let config_dir = Self::config_dir()?;
        Ok(config_dir.join(&self.database.path))
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  database: {} (max {} connections)",
            self.database.path, self.database.max_connections
        );
        info!(
            "  auth: admin designation {}",
            if self.auth.admin_email().is_some() {
                "configured"
            } else {
                "not configured"
            }
        );
        info!(
            "  remember_me: {} (local logins: {}, cookie: {}, max-age: {}s, expiry: {})",
            if self.remember_me.enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.remember_me.local_logins,
            self.remember_me.cookie_name,
            self.remember_me.max_age_secs,
            self.remember_me
                .expire_after_days
                .map(|days| format!("{days}d after last use"))
                .unwrap_or_else(|| String::from("none")),
        );
        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );
    }

    fn apply_env_overrides(&mut self) {
        // Database
        Self::apply_env_string("FH_DATABASE_PATH", &mut self.database.path);
        Self::apply_env_parse(
            "FH_DATABASE_MAX_CONNECTIONS",
            &mut self.database.max_connections,
        );

        // Auth
        Self::apply_env_option_string(LEGACY_ADMIN_EMAIL_ENV, &mut self.auth.admin_email);
        Self::apply_env_option_string("FH_AUTH_ADMIN_EMAIL", &mut self.auth.admin_email);

        // Remember-me
        Self::apply_env_bool("FH_REMEMBER_ME_ENABLED", &mut self.remember_me.enabled);
        Self::apply_env_bool(
            "FH_REMEMBER_ME_LOCAL_LOGINS",
            &mut self.remember_me.local_logins,
        );
        Self::apply_env_string(
            "FH_REMEMBER_ME_COOKIE_NAME",
            &mut self.remember_me.cookie_name,
        );
        Self::apply_env_parse(
            "FH_REMEMBER_ME_MAX_AGE_SECS",
            &mut self.remember_me.max_age_secs,
        );
        Self::apply_env_bool("FH_REMEMBER_ME_SECURE", &mut self.remember_me.secure);
        Self::apply_env_parse("FH_REMEMBER_ME_SAME_SITE", &mut self.remember_me.same_site);
        if let Ok(val) = std::env::var("FH_REMEMBER_ME_EXPIRE_AFTER_DAYS")
            && let Ok(days) = val.parse()
        {
            self.remember_me.expire_after_days = Some(days);
        }

        // Logging
        Self::apply_env_parse("FH_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("FH_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("FH_LOG_FILE", &mut self.logging.file);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
