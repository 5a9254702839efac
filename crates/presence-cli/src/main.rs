//! # presence CLI entry point
//!
//! Parses command-line arguments, initializes logging, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use presence_cli::holidays::{run_holidays, HolidaysArgs};
use presence_cli::validate::{run_validate, run_windows, ValidateArgs};
use presence_core::CalendarDate;

/// Exit code for operational failures, distinct from "not compliant".
const EXIT_ERROR: u8 = 2;

/// Rolling in-office attendance checker.
///
/// Marks calendar days as working, out-of-office or holiday and checks that
/// every sliding window of weeks meets a minimum number of in-office days.
#[derive(Parser, Debug)]
#[command(name = "presence", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to the YAML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check marked days against the compliance policy.
    Validate(ValidateArgs),

    /// List every window with its in-office count.
    Windows(ValidateArgs),

    /// Print holiday dates for a country.
    Holidays(HolidaysArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "presence starting");

    let config = cli.config.as_deref();
    let today = CalendarDate::today();
    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args, config, today).await,
        Commands::Windows(args) => run_windows(args, config, today).await,
        Commands::Holidays(args) => run_holidays(args, config).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
