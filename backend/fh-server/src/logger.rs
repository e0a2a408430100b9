use crate::error::{Result as ServerErrorResult, ServerError};

use fh_config::{Config, LoggingConfig};

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{Record, info};

/// `<config dir>/<logging.dir>/<logging.file>` when a log file is configured.
/// Creates the log directory.
pub fn log_file_path(logging: &LoggingConfig) -> ServerErrorResult<Option<PathBuf>> {
    let Some(filename) = logging.file.as_deref() else {
        return Ok(None);
    };

    let log_dir = Config::config_dir()?.join(&logging.dir);
    std::fs::create_dir_all(&log_dir).map_err(|e| ServerError::Logger {
        message: format!("Failed to create log directory {}: {}", log_dir.display(), e),
    })?;

    Ok(Some(log_dir.join(filename)))
}

/// Install the global logger. File output is always plain; stdout is colored
/// when `logging.colored` is set.
pub fn initialize(logging: &LoggingConfig, log_file: Option<PathBuf>) -> ServerErrorResult<()> {
    let level_filter = *logging.level;

    let output = match &log_file {
        Some(path) => {
            let file = fern::log_file(path).map_err(|e| ServerError::Logger {
                message: format!("Failed to open log file {}: {}", path.display(), e),
            })?;
            Dispatch::new().format(plain_format).chain(file)
        }
        None if logging.colored => {
            let colors = ColoredLevelConfig::new()
                .trace(Color::Magenta)
                .debug(Color::Blue)
                .info(Color::Green)
                .warn(Color::Yellow)
                .error(Color::Red);

            Dispatch::new()
                .format(move |out, message, record| {
                    write_line(out, message, record, colors.color(record.level()))
                })
                .chain(std::io::stdout())
        }
        None => Dispatch::new().format(plain_format).chain(std::io::stdout()),
    };

    Dispatch::new()
        .level(level_filter)
        // sqlx logs every statement at info
        .level_for("sqlx", log::LevelFilter::Warn)
        .chain(output)
        .apply()
        .map_err(|e| ServerError::Logger {
            message: format!("Failed to initialize logger: {e}"),
        })?;

    match &log_file {
        Some(path) => info!("Logger initialized: level={level_filter}, file={}", path.display()),
        None => info!("Logger initialized: level={level_filter}, stdout"),
    }

    // Bridge tracing to log
    tracing_log::LogTracer::init().ok();

    Ok(())
}

fn plain_format(out: FormatCallback, message: &fmt::Arguments, record: &Record) {
    write_line(out, message, record, record.level());
}

fn write_line(
    out: FormatCallback,
    message: &fmt::Arguments,
    record: &Record,
    level: impl fmt::Display,
) {
    out.finish(format_args!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = humantime::format_rfc3339(SystemTime::now()),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}
