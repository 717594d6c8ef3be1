//! Loop hosting commands: replay a recording or run a synthetic drive.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use openracing_shaker::{
    ConfigHandle, LoopStats, ShakerConfig, ShakerError, TelemetryError, TelemetrySource,
    TickOutcome, VibrationLoop,
};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::commands::{LoopArgs, config};
use crate::output;
use crate::sink::OscillatorLog;
use crate::source::{SyntheticDrive, load_recording};

/// One traced tick.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub tick: u64,
    pub at_ms: u64,
    pub frequency_hz: Option<u32>,
    pub outcome: String,
}

/// What a loop run did.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub tick_ms: u64,
    pub realtime: bool,
    pub interrupted: bool,
    pub duration_ms: u64,
    pub stats: LoopStats,
    pub oscillator: OscillatorLog,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceEntry>,
}

/// Replay a JSON-lines telemetry recording.
pub async fn execute_run(file: &Path, args: &LoopArgs, json: bool) -> Result<()> {
    let config = config::resolve(args.config.as_deref(), &args.overrides)?;
    let source = load_recording(file)?;
    let summary = drive(source, config, args, file.display().to_string(), json).await?;
    output::print_run_summary(&summary, json)
}

/// Run the built-in synthetic drive for `seconds`.
pub async fn execute_simulate(seconds: u64, args: &LoopArgs, json: bool) -> Result<()> {
    let config = config::resolve(args.config.as_deref(), &args.overrides)?;
    let source = SyntheticDrive::new(seconds.saturating_mul(1000), args.tick_ms);
    let summary = drive(source, config, args, "synthetic".to_string(), json).await?;
    output::print_run_summary(&summary, json)
}

struct Tracer {
    enabled: bool,
    live: bool,
    entries: Vec<TraceEntry>,
}

impl Tracer {
    fn record(&mut self, tick: u64, elapsed: Duration, outcome: &TickOutcome) {
        if !self.enabled {
            return;
        }
        let entry = TraceEntry {
            tick,
            at_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            frequency_hz: outcome.frequency_hz(),
            outcome: format!("{outcome:?}"),
        };
        if self.live {
            output::print_trace_entry(&entry);
        } else {
            self.entries.push(entry);
        }
    }
}

async fn drive<S: TelemetrySource>(
    source: S,
    config: ShakerConfig,
    args: &LoopArgs,
    label: String,
    json: bool,
) -> Result<RunSummary> {
    let handle = ConfigHandle::new(config)?;
    let tick = Duration::from_millis(args.tick_ms);
    let mut tracer = Tracer {
        enabled: args.trace,
        live: !json,
        entries: Vec::new(),
    };

    info!(source = %label, tick_ms = args.tick_ms, realtime = args.realtime, "Starting shaker loop");
    let start = Instant::now();
    let mut shaker = VibrationLoop::starting_at(source, OscillatorLog::new(), handle, start);

    let interrupted = if args.realtime {
        run_paced(&mut shaker, tick, &mut tracer).await?
    } else {
        run_virtual(&mut shaker, start, tick, &mut tracer)?;
        false
    };

    let (_, oscillator, stats) = shaker.into_parts();
    Ok(RunSummary {
        source: label,
        tick_ms: args.tick_ms,
        realtime: args.realtime,
        interrupted,
        duration_ms: stats.ticks.saturating_mul(args.tick_ms),
        stats,
        oscillator,
        trace: tracer.entries,
    })
}

/// Step on a virtual clock until the source is exhausted.
fn run_virtual<S: TelemetrySource>(
    shaker: &mut VibrationLoop<S, OscillatorLog>,
    start: Instant,
    tick: Duration,
    tracer: &mut Tracer,
) -> Result<()> {
    let mut now = start;
    loop {
        match shaker.step_at(now) {
            Ok(outcome) => {
                tracer.record(
                    shaker.stats().ticks,
                    now.saturating_duration_since(start),
                    &outcome,
                );
            }
            Err(ShakerError::Telemetry(TelemetryError::Disconnected)) => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        now = now.checked_add(tick).unwrap_or(now);
    }
}

/// Step once per wall-clock interval. Returns whether Ctrl-C stopped the loop.
async fn run_paced<S: TelemetrySource>(
    shaker: &mut VibrationLoop<S, OscillatorLog>,
    tick: Duration,
    tracer: &mut Tracer,
) -> Result<bool> {
    let start = Instant::now();
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                info!(ticks = shaker.stats().ticks, "Interrupted, stopping shaker loop");
                return Ok(true);
            }
            _ = interval.tick() => {
                match shaker.step() {
                    Ok(outcome) => {
                        tracer.record(shaker.stats().ticks, start.elapsed(), &outcome);
                    }
                    Err(ShakerError::Telemetry(TelemetryError::Disconnected)) => return Ok(false),
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openracing_shaker::{ReplaySource, TelemetrySample};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn args(trace: bool) -> LoopArgs {
        LoopArgs {
            config: None,
            overrides: Vec::new(),
            tick_ms: 10,
            realtime: false,
            trace,
        }
    }

    fn moving(rpm: f32) -> TelemetrySample {
        TelemetrySample {
            speed_kmh: 80.0,
            rpm,
            ..TelemetrySample::default()
        }
    }

    #[tokio::test]
    async fn test_drive_replays_to_completion() -> TestResult {
        let source = ReplaySource::from_samples([moving(3000.0), moving(4500.0), moving(4500.0)]);
        let summary = drive(source, ShakerConfig::default(), &args(false), "test".into(), true).await?;

        assert_eq!(summary.stats.ticks, 3);
        assert_eq!(summary.duration_ms, 30);
        assert_eq!(summary.oscillator.current_hz, Some(40));
        assert_eq!(summary.oscillator.changes, 2);
        assert!(summary.trace.is_empty());
        assert!(!summary.interrupted);
        Ok(())
    }

    #[tokio::test]
    async fn test_trace_collected_for_json() -> TestResult {
        let mut source = ReplaySource::new();
        source.push(moving(3000.0));
        source.push_gap();
        let summary = drive(source, ShakerConfig::default(), &args(true), "test".into(), true).await?;

        assert_eq!(summary.trace.len(), 2);
        assert_eq!(summary.trace.first().and_then(|e| e.frequency_hz), Some(30));
        assert_eq!(summary.trace.get(1).map(|e| e.at_ms), Some(10));
        assert_eq!(summary.trace.get(1).and_then(|e| e.frequency_hz), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_realtime_drive_finishes() -> TestResult {
        let source = SyntheticDrive::new(50, 5);
        let mut loop_args = args(false);
        loop_args.realtime = true;
        loop_args.tick_ms = 5;
        let summary = drive(source, ShakerConfig::default(), &loop_args, "synthetic".into(), true).await?;

        assert_eq!(summary.stats.ticks, 10);
        assert!(!summary.interrupted);
        Ok(())
    }

    #[tokio::test]
    async fn test_synthetic_drive_shifts_gears() -> TestResult {
        let source = SyntheticDrive::new(20_000, 10);
        let summary = drive(source, ShakerConfig::default(), &args(false), "synthetic".into(), true).await?;

        // Neutral to first, then five upshifts and the wrap back to first
        assert_eq!(summary.stats.gear_shifts, 7);
        assert_eq!(summary.stats.stationary, 100);
        assert_eq!(summary.stats.muted, 0);
        Ok(())
    }
}
