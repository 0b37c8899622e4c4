//! Binary crate for the `weather-reporter` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive prompts and configuration
//! - Logger setup and mapping failures to exit codes

use std::{process::ExitCode, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug};

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = cli::Cli::parse();
    init_logger(cmd.log_level.as_deref());
    debug!("parsed arguments: {cmd:?}");

    match cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(cli::exit_code(&err))
        }
    }
}

fn init_logger(level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    if let Some(level) = level {
        let filter = LevelFilter::from_str(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level: {level}. Using 'warn' instead.");
            LevelFilter::Warn
        });
        builder.filter_level(filter);
    }

    builder.init();
}
