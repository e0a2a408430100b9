use crate::commands::Commands;

use clap::Parser;

#[derive(Parser)]
#[command(name = "fh-server")]
#[command(about = "Food History identity and remember-me administration")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}
