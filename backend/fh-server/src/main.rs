//! fh-server - Food History identity administration
//!
//! # Examples
//!
//! ```bash
//! # Upgrade the database (safe to repeat)
//! fh-server migrate
//!
//! # Hash a password for seeding an account
//! echo 'correct horse 9' | fh-server hash-password
//!
//! # Authorize an account as the configured administrator
//! fh-server authorize --actor admin@example.com 6f1c...
//! ```

use fh_config::Config;
use fh_server::cli::Cli;
use fh_server::commands::execute;
use fh_server::logger;

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, Box<dyn Error>> {
    // Load and validate configuration
    let config = Config::load()?;
    config.validate()?;

    // Initialize logger (before any other logging)
    let log_file = logger::log_file_path(&config.logging)?;
    logger::initialize(&config.logging, log_file)?;

    info!("Starting fh-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let stdin = std::io::stdin();
    let output = execute(cli.command, &config, &mut stdin.lock()).await?;

    Ok(output)
}
