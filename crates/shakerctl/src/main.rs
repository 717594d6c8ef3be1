//! shakerctl - Bass Shaker Control CLI
//!
//! Hosts the OpenRacing shaker loop from the command line: replays recorded
//! telemetry, runs a synthetic drive and edits shaker configuration files.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;
mod sink;
mod source;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{ConfigCommands, LoopArgs};

#[derive(Parser)]
#[command(name = "shakerctl")]
#[command(about = "Bass Shaker Control CLI - Turn racing telemetry into tactile vibration")]
#[command(version)]
#[command(long_about = "
shakerctl drives the OpenRacing bass shaker loop. Each tick blends RPM,
tire slip and suspension signals into one oscillator frequency, kicks on
gear changes and mutes when the telemetry stops moving.

Use `run` to replay a JSON-lines recording, `simulate` for a built-in
drive, and `config` to inspect or edit settings.
Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a telemetry recording (one JSON sample per line)
    Run {
        /// Recording path
        file: PathBuf,

        #[command(flatten)]
        args: LoopArgs,
    },

    /// Run the loop against a synthetic drive through the gearbox
    Simulate {
        /// Length of the drive in seconds
        #[arg(short, long, default_value_t = 20)]
        seconds: u64,

        #[command(flatten)]
        args: LoopArgs,
    },

    /// Configuration file commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("shakerctl={log_level},openracing_shaker={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(error::exit_code(&e))
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run { file, args } => commands::run::execute_run(file, args, cli.json).await,
        Commands::Simulate { seconds, args } => {
            commands::run::execute_simulate(*seconds, args, cli.json).await
        }
        Commands::Config(cmd) => commands::config::execute(cmd, cli.json),
    }
}
