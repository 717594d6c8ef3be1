//! Output formatting for CLI responses

use std::path::Path;

use anyhow::{Error, Result};
use colored::*;
use openracing_shaker::{SILENT_HZ, ShakerConfig};
use serde_json::json;

use crate::commands::run::{RunSummary, TraceEntry};
use crate::error::CliError;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::TelemetryNotFound(_)) => "telemetry_not_found",
        Some(CliError::ConfigNotFound(_)) => "config_not_found",
        Some(CliError::InvalidConfiguration(_)) => "invalid_configuration",
        Some(CliError::AlreadyExists(_)) => "already_exists",
        Some(CliError::JsonError(_)) => "json",
        None if error.downcast_ref::<openracing_shaker::ConfigError>().is_some() => {
            "invalid_configuration"
        }
        None => "error",
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).map_err(CliError::from)?);
    Ok(())
}

/// Print a plain success message
pub fn print_success(message: &str, json: bool) -> Result<()> {
    if json {
        print_json(&json!({ "success": true, "message": message }))
    } else {
        println!("{} {}", "✓".green(), message);
        Ok(())
    }
}

/// Print the named parameters of a config
pub fn print_config(config: &ShakerConfig, origin: &str, json: bool) -> Result<()> {
    let parameters = config.parameters();
    if json {
        let map: serde_json::Map<String, serde_json::Value> = parameters
            .into_iter()
            .map(|(name, value)| (name.to_string(), serde_json::Value::String(value)))
            .collect();
        return print_json(&json!({
            "success": true,
            "origin": origin,
            "config": config,
            "parameters": map,
        }));
    }

    println!("{} {}", "Shaker configuration:".bold(), origin.dimmed());
    let width = parameters
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, value) in parameters {
        println!("  {name:<width$}  {value}");
    }
    Ok(())
}

/// Print the result of validating a config file
pub fn print_validated(path: &Path, config: &ShakerConfig, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({
            "success": true,
            "path": path.display().to_string(),
            "enabled_signals": config
                .enabled_signals()
                .map(|kind| kind.name())
                .collect::<Vec<_>>(),
        }));
    }

    println!("{} {} is valid", "✓".green(), path.display());
    let enabled: Vec<&str> = config.enabled_signals().map(|kind| kind.name()).collect();
    if enabled.is_empty() {
        println!(
            "  {} no signals enabled, shaker will sit at {} Hz",
            "!".yellow(),
            config.normal_frequency_hz
        );
    } else {
        println!("  Signals: {}", enabled.join(", "));
    }
    Ok(())
}

/// Print one traced tick
pub fn print_trace_entry(entry: &TraceEntry) {
    let hz = match entry.frequency_hz {
        Some(SILENT_HZ) => "  off".red().to_string(),
        Some(hz) => format!("{hz:>3} Hz"),
        None => "    -".dimmed().to_string(),
    };
    println!("{:>7} {:>8}ms  {}  {}", entry.tick, entry.at_ms, hz, entry.outcome.dimmed());
}

/// Print the summary of a loop run
pub fn print_run_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({
            "success": true,
            "summary": summary,
        }));
    }

    let stats = &summary.stats;
    let osc = &summary.oscillator;
    let heading = if summary.interrupted {
        "Shaker loop interrupted".yellow().bold()
    } else {
        "Shaker loop finished".green().bold()
    };
    println!("{} ({})", heading, summary.source);
    println!(
        "  Ticks: {} at {} ms ({:.1} s)",
        stats.ticks,
        summary.tick_ms,
        summary.duration_ms as f64 / 1000.0
    );
    println!(
        "  Updates: {}  Skipped: {}  Source errors: {}",
        stats.updates, stats.skipped, stats.source_errors
    );
    println!(
        "  Gear shifts: {}  Muted ticks: {}  Stationary ticks: {}",
        stats.gear_shifts, stats.muted, stats.stationary
    );
    if stats.config_swaps > 0 {
        println!("  Config swaps: {}", stats.config_swaps);
    }

    match osc.current_hz {
        Some(SILENT_HZ) => println!("  Final frequency: {}", "off".red()),
        Some(hz) => println!("  Final frequency: {hz} Hz"),
        None => println!("  Final frequency: {}", "never set".dimmed()),
    }
    if let Some(hz) = osc.dominant_hz() {
        println!(
            "  Dominant frequency: {} Hz, {} changes, {:.1}% silent",
            hz,
            osc.changes,
            osc.silent_ratio() * 100.0
        );
    }
    Ok(())
}
