//! Command implementations for shakerctl

pub mod config;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Options shared by every command that drives the shaker loop.
#[derive(Args, Debug, Clone)]
pub struct LoopArgs {
    /// Config file (YAML, or JSON with a .json extension)
    #[arg(short, long, env = "SHAKERCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override a parameter, e.g. --set gear_shift_freq=40
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub overrides: Vec<(String, String)>,

    /// Tick interval in milliseconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=1000))]
    pub tick_ms: u64,

    /// Pace ticks in wall-clock time instead of running as fast as possible
    #[arg(long)]
    pub realtime: bool,

    /// Print the outcome of every tick
    #[arg(long)]
    pub trace: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Config file to read instead of the defaults
        #[arg(short, long, env = "SHAKERCTL_CONFIG")]
        config: Option<PathBuf>,

        /// Override a parameter before printing
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        overrides: Vec<(String, String)>,

        /// Print the full YAML document instead of the parameter table
        #[arg(long)]
        yaml: bool,
    },

    /// Check a config file without running anything
    Validate {
        /// Config file path
        file: PathBuf,
    },

    /// Change named parameters in a config file
    Set {
        /// Config file path
        file: PathBuf,

        /// Assignments such as base_freq=25 use_susp=on
        #[arg(required = true, value_name = "NAME=VALUE", value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },

    /// Write a config file holding the defaults
    Init {
        /// Config file path
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Split `name=value`, trimming both halves.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(format!("expected NAME=VALUE, got '{raw}'"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
