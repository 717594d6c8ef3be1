//! Vibration controller
//!
//! Runs one tick of the shaker control loop:
//!
//! 1. Reject missing or malformed samples and hold the last output.
//! 2. Let the gear-shift override claim the tick.
//! 3. While moving, evaluate every enabled generator, track changes and fuse.
//! 4. Mute when nothing monitored has changed for the staleness delay.
//!
//! A stationary car leaves the oscillator untouched.

use std::time::Instant;

use tracing::{debug, warn};

use crate::SILENT_HZ;
use crate::config::ShakerConfig;
use crate::fusion::{Contribution, fuse};
use crate::gear_shift::{GearShiftOverride, ShiftOutput};
use crate::generators::SignalKind;
use crate::telemetry::TelemetrySample;
use crate::tracker::ChangeTracker;

/// Why a tick produced no oscillator update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No sample arrived this tick
    MissingSample,
    /// The sample carried non-finite values
    MalformedSample,
}

/// Result of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Gear change detected; the kick starts.
    ShiftStarted {
        /// Newly engaged gear
        gear: u8,
        /// Kick frequency
        frequency_hz: u32,
    },
    /// Gear-shift kick still running; fusion suppressed.
    ShiftHolding {
        /// Kick frequency
        frequency_hz: u32,
    },
    /// Gear-shift kick ended; oscillator set to the normal frequency.
    ShiftReleased {
        /// Normal frequency
        frequency_hz: u32,
    },
    /// Fused signal output.
    Vibrating {
        /// Blended frequency
        frequency_hz: u32,
        /// Number of generators that contributed
        sources: usize,
    },
    /// Nothing monitored changed for too long; output forced to silence.
    Muted {
        /// What fusion would have produced
        blended_hz: u32,
    },
    /// Car is not moving; the oscillator keeps its last frequency.
    Stationary,
    /// No usable sample; the oscillator keeps its last frequency.
    Skipped(SkipReason),
}

impl TickOutcome {
    /// Frequency to write to the oscillator, `None` to leave it as is.
    pub fn frequency_hz(&self) -> Option<u32> {
        match *self {
            TickOutcome::ShiftStarted { frequency_hz, .. }
            | TickOutcome::ShiftHolding { frequency_hz }
            | TickOutcome::ShiftReleased { frequency_hz }
            | TickOutcome::Vibrating { frequency_hz, .. } => Some(frequency_hz),
            TickOutcome::Muted { .. } => Some(SILENT_HZ),
            TickOutcome::Stationary | TickOutcome::Skipped(_) => None,
        }
    }

    /// Whether the gear-shift override owned this tick.
    pub fn is_gear_shift(&self) -> bool {
        matches!(
            self,
            TickOutcome::ShiftStarted { .. }
                | TickOutcome::ShiftHolding { .. }
                | TickOutcome::ShiftReleased { .. }
        )
    }
}

impl From<ShiftOutput> for TickOutcome {
    fn from(output: ShiftOutput) -> Self {
        match output {
            ShiftOutput::Started { gear, frequency_hz } => {
                TickOutcome::ShiftStarted { gear, frequency_hz }
            }
            ShiftOutput::Holding { frequency_hz } => TickOutcome::ShiftHolding { frequency_hz },
            ShiftOutput::Released { frequency_hz } => TickOutcome::ShiftReleased { frequency_hz },
        }
    }
}

/// Per-tick orchestrator owning the change tracker and gear override.
#[derive(Debug, Clone)]
pub struct VibrationController {
    tracker: ChangeTracker,
    gear_shift: GearShiftOverride,
    last_output_hz: Option<u32>,
}

impl VibrationController {
    /// Create a controller whose staleness clock starts at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            tracker: ChangeTracker::new(now),
            gear_shift: GearShiftOverride::new(),
            last_output_hz: None,
        }
    }

    /// Run one tick.
    ///
    /// Never fails: bad input degrades to holding the previous output.
    pub fn tick(
        &mut self,
        sample: Option<&TelemetrySample>,
        config: &ShakerConfig,
        now: Instant,
    ) -> TickOutcome {
        let Some(sample) = sample else {
            debug!("No telemetry sample this tick, holding output");
            return TickOutcome::Skipped(SkipReason::MissingSample);
        };

        if let Err(err) = sample.validate() {
            warn!(error = %err, "Malformed telemetry sample, holding output");
            return TickOutcome::Skipped(SkipReason::MalformedSample);
        }

        if let Some(shift) =
            self.gear_shift
                .observe(sample.gears, now, &config.gear_shift, config.normal_frequency_hz)
        {
            return self.emit(shift.into());
        }

        if !sample.is_moving() {
            return TickOutcome::Stationary;
        }

        let mut contributions = [Contribution::default(); SignalKind::COUNT];
        let mut sources = 0usize;
        for kind in config.enabled_signals() {
            let signal = config.signal(kind);
            let aggregate = kind.aggregate(sample);
            match kind.frequency(aggregate, signal, config.base_frequency_hz) {
                Ok(frequency_hz) => {
                    self.tracker.observe(kind, aggregate, now);
                    if let Some(slot) = contributions.get_mut(sources) {
                        *slot = Contribution::new(frequency_hz, signal.intensity);
                        sources += 1;
                    }
                }
                Err(err) => {
                    warn!(signal = %kind, error = %err, "Skipping malformed generator");
                }
            }
        }

        let blended_hz = fuse(
            contributions.get(..sources).unwrap_or_default(),
            config.normal_frequency_hz,
        );

        debug!(
            speed_kmh = sample.speed_kmh,
            rpm = sample.rpm,
            gear = sample.current_gear(),
            blended_hz,
            sources,
            "Shaker tick"
        );

        if self.tracker.is_stale(now, config.stop_vibration_delay()) {
            return self.emit(TickOutcome::Muted { blended_hz });
        }

        self.emit(TickOutcome::Vibrating {
            frequency_hz: blended_hz,
            sources,
        })
    }

    /// Last frequency written to the oscillator, if any.
    pub fn last_output_hz(&self) -> Option<u32> {
        self.last_output_hz
    }

    /// Change tracker state.
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Gear override state.
    pub fn gear_shift(&self) -> &GearShiftOverride {
        &self.gear_shift
    }

    /// Forget tracked values, cancel any kick and restart the staleness clock.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    fn emit(&mut self, outcome: TickOutcome) -> TickOutcome {
        if let Some(hz) = outcome.frequency_hz() {
            self.last_output_hz = Some(hz);
        }
        outcome
    }
}
