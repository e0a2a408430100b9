use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] fh_config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] fh_db::DbError),

    #[error("{0}")]
    Auth(#[from] fh_auth::AuthError),

    #[error("Logger error: {message}")]
    Logger { message: String },

    #[error("Failed to read {what} from stdin: {source}")]
    Stdin {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    InvalidInput { message: String },
}

pub type Result<T> = std::result::Result<T, ServerError>;
