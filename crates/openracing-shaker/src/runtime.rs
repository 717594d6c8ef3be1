//! Control loop driver
//!
//! [`VibrationLoop`] wires a [`TelemetrySource`], the
//! [`VibrationController`] and an [`OscillatorSink`] together. Each call to
//! [`VibrationLoop::step`] takes one config snapshot, pulls one sample, runs
//! one tick and forwards the result to the oscillator.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigHandle, ShakerConfig};
use crate::controller::{TickOutcome, VibrationController};
use crate::error::{ShakerError, ShakerResult, TelemetryError};
use crate::telemetry::TelemetrySource;

/// Receives the oscillator frequency whenever it must change.
pub trait OscillatorSink {
    /// Set the oscillator to `hz`; `0` silences it.
    fn set_frequency(&mut self, hz: u32);
}

/// Records every frequency written, in order.
impl OscillatorSink for Vec<u32> {
    fn set_frequency(&mut self, hz: u32) {
        self.push(hz);
    }
}

impl<T: OscillatorSink + ?Sized> OscillatorSink for &mut T {
    fn set_frequency(&mut self, hz: u32) {
        (**self).set_frequency(hz);
    }
}

/// Counters collected by the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    /// Ticks executed
    pub ticks: u64,
    /// Ticks that wrote a frequency to the oscillator
    pub updates: u64,
    /// Ticks without a usable sample
    pub skipped: u64,
    /// Transient errors reported by the telemetry source
    pub source_errors: u64,
    /// Gear changes detected
    pub gear_shifts: u64,
    /// Ticks that muted the oscillator
    pub muted: u64,
    /// Ticks with the car standing still
    pub stationary: u64,
    /// Configuration swaps picked up at a tick boundary
    pub config_swaps: u64,
}

impl LoopStats {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        if outcome.frequency_hz().is_some() {
            self.updates += 1;
        }
        match outcome {
            TickOutcome::ShiftStarted { .. } => self.gear_shifts += 1,
            TickOutcome::Muted { .. } => self.muted += 1,
            TickOutcome::Stationary => self.stationary += 1,
            TickOutcome::Skipped(_) => self.skipped += 1,
            TickOutcome::ShiftHolding { .. }
            | TickOutcome::ShiftReleased { .. }
            | TickOutcome::Vibrating { .. } => {}
        }
    }
}

/// Single-threaded shaker control loop.
#[derive(Debug)]
pub struct VibrationLoop<S, O> {
    controller: VibrationController,
    source: S,
    sink: O,
    config: ConfigHandle,
    active: Arc<ShakerConfig>,
    stats: LoopStats,
}

impl<S: TelemetrySource, O: OscillatorSink> VibrationLoop<S, O> {
    /// Create a loop whose staleness clock starts now.
    pub fn new(source: S, sink: O, config: ConfigHandle) -> Self {
        Self::starting_at(source, sink, config, Instant::now())
    }

    /// Create a loop whose staleness clock starts at `now`.
    ///
    /// Use with [`Self::step_at`] to drive the loop from a virtual clock.
    pub fn starting_at(source: S, sink: O, config: ConfigHandle, now: Instant) -> Self {
        let active = config.snapshot();
        Self {
            controller: VibrationController::new(now),
            source,
            sink,
            config,
            active,
            stats: LoopStats::default(),
        }
    }

    /// Run one tick at the current instant.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Disconnected`] once the source is exhausted.
    pub fn step(&mut self) -> ShakerResult<TickOutcome> {
        self.step_at(Instant::now())
    }

    /// Run one tick at `now`.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Disconnected`] once the source is exhausted. Other
    /// source errors are counted and the tick proceeds without a sample.
    pub fn step_at(&mut self, now: Instant) -> ShakerResult<TickOutcome> {
        let snapshot = self.config.snapshot();
        if !Arc::ptr_eq(&snapshot, &self.active) {
            info!("Applying updated shaker configuration at tick boundary");
            self.active = snapshot;
            self.stats.config_swaps += 1;
        }

        let sample = match self.source.next_sample() {
            Ok(sample) => sample,
            Err(TelemetryError::Disconnected) => {
                return Err(TelemetryError::Disconnected.into());
            }
            Err(err) => {
                debug!(error = %err, "Telemetry source error");
                self.stats.source_errors += 1;
                None
            }
        };

        let outcome = self.controller.tick(sample.as_ref(), &self.active, now);
        self.stats.record(&outcome);
        if let Some(hz) = outcome.frequency_hz() {
            self.sink.set_frequency(hz);
        }
        Ok(outcome)
    }

    /// Run up to `n` ticks at wall-clock time, stopping early on disconnect.
    ///
    /// # Errors
    ///
    /// Source errors other than a disconnect are never returned; a
    /// disconnect before the first tick is.
    pub fn run_ticks(&mut self, n: u64) -> ShakerResult<LoopStats> {
        for done in 0..n {
            match self.step() {
                Ok(_) => {}
                Err(ShakerError::Telemetry(TelemetryError::Disconnected)) if done > 0 => break,
                Err(err) => return Err(err),
            }
        }
        Ok(self.stats)
    }

    /// Tick until the source disconnects, advancing a virtual clock by
    /// `tick` each iteration starting at `start`.
    pub fn run_replay(&mut self, start: Instant, tick: std::time::Duration) -> LoopStats {
        let mut now = start;
        while self.step_at(now).is_ok() {
            now = now.checked_add(tick).unwrap_or(now);
        }
        info!(
            ticks = self.stats.ticks,
            updates = self.stats.updates,
            gear_shifts = self.stats.gear_shifts,
            muted = self.stats.muted,
            "Replay finished"
        );
        self.stats
    }

    /// Counters so far.
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// The controller driving this loop.
    pub fn controller(&self) -> &VibrationController {
        &self.controller
    }

    /// Shared config handle; clone it to update settings while running.
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// The oscillator sink.
    pub fn sink(&self) -> &O {
        &self.sink
    }

    /// Take the loop apart.
    pub fn into_parts(self) -> (S, O, LoopStats) {
        (self.source, self.sink, self.stats)
    }
}
