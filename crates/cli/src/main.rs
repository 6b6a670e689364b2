#![forbid(unsafe_code)]

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use ct_storage::SchemaError;
use std::process::ExitCode;
use tracing::{Level, error};

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, &cli.log_format);

    match commands::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = err.code(), "{err}");
            eprintln!("error [{}]: {err}", err.code());
            ExitCode::from(exit_code(&err))
        }
    }
}

fn setup_logging(level: &str, format: &str) {
    let level = match level {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn exit_code(err: &SchemaError) -> u8 {
    match err {
        SchemaError::VersionSkew { .. } => 3,
        SchemaError::Concurrency { .. } => 4,
        SchemaError::DataIntegrity { .. } => 5,
        SchemaError::Structural { .. } | SchemaError::Registry(_) => 6,
        SchemaError::Config(_) | SchemaError::Yaml(_) => 2,
        _ => 1,
    }
}
