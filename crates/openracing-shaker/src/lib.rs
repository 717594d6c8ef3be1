//! Telemetry-driven bass shaker synthesis for OpenRacing
//!
//! This crate turns live driving telemetry into a single oscillator frequency
//! for a bass-shaker transducer. Several virtual vibration signals are
//! computed independently and blended by intensity; gear changes trigger a
//! short override kick; the output is muted when telemetry stops moving.
//!
//! # Overview
//!
//! - **Generators**: RPM, tire slip and suspension travel mapped into the
//!   `[20, 90]` Hz shaker band
//! - **Change Tracker**: shared staleness clock across monitored quantities
//! - **Fusion**: intensity-weighted mean of enabled generators
//! - **Gear-Shift Override**: fixed-frequency kick on every gear change
//! - **Controller**: one control-loop tick combining all of the above
//! - **Runtime**: loop driver between a telemetry source and an oscillator
//!
//! Configuration is an immutable [`ShakerConfig`] snapshot swapped through a
//! [`ConfigHandle`], so settings can change while the loop runs.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use openracing_shaker::prelude::*;
//!
//! let t0 = Instant::now();
//! let samples = [
//!     TelemetrySample { speed_kmh: 90.0, rpm: 4500.0, ..TelemetrySample::default() },
//!     TelemetrySample { speed_kmh: 92.0, rpm: 4650.0, ..TelemetrySample::default() },
//! ];
//! let mut shaker = VibrationLoop::starting_at(
//!     ReplaySource::from_samples(samples),
//!     Vec::new(),
//!     ConfigHandle::default(),
//!     t0,
//! );
//!
//! let stats = shaker.run_replay(t0, Duration::from_millis(10));
//! assert_eq!(stats.updates, 2);
//! assert_eq!(shaker.sink(), &vec![40, 41]);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod controller;
pub mod error;
pub mod fusion;
pub mod gear_shift;
pub mod generators;
pub mod prelude;
pub mod runtime;
pub mod telemetry;
pub mod tracker;

pub use config::{ConfigHandle, GearShiftConfig, ShakerConfig, SignalConfig};
pub use controller::{SkipReason, TickOutcome, VibrationController};
pub use error::{ConfigError, GeneratorError, ShakerError, ShakerResult, TelemetryError};
pub use fusion::{Contribution, fuse};
pub use gear_shift::{GearShiftOverride, ShiftOutput, ShiftPhase};
pub use generators::SignalKind;
pub use runtime::{LoopStats, OscillatorSink, VibrationLoop};
pub use telemetry::{ReplaySource, TelemetrySample, TelemetrySource};
pub use tracker::ChangeTracker;

/// Lowest frequency any generator may output.
pub const MIN_FREQUENCY_HZ: u32 = 20;

/// Highest frequency any generator may output.
pub const MAX_FREQUENCY_HZ: u32 = 90;

/// Output used to silence the shaker. Never produced by a generator.
pub const SILENT_HZ: u32 = 0;

/// Upper bound of a signal's intensity weight.
pub const MAX_INTENSITY: u8 = 100;
