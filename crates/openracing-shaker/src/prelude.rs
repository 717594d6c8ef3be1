//! Prelude for the shaker crate.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use openracing_shaker::prelude::*;
//!
//! let config = ShakerConfig::default();
//! let mut controller = VibrationController::new(Instant::now());
//!
//! let sample = TelemetrySample { speed_kmh: 60.0, rpm: 3000.0, ..TelemetrySample::default() };
//! let outcome = controller.tick(Some(&sample), &config, Instant::now());
//! assert_eq!(outcome.frequency_hz(), Some(30));
//! ```

pub use crate::config::{ConfigHandle, GearShiftConfig, ShakerConfig, SignalConfig};
pub use crate::controller::{SkipReason, TickOutcome, VibrationController};
pub use crate::error::{ConfigError, ShakerError, ShakerResult, TelemetryError};
pub use crate::fusion::{Contribution, fuse};
pub use crate::generators::{
    SignalKind, rpm_frequency, suspension_frequency, tire_slip_frequency,
};
pub use crate::runtime::{LoopStats, OscillatorSink, VibrationLoop};
pub use crate::telemetry::{ReplaySource, TelemetrySample, TelemetrySource};
pub use crate::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ, SILENT_HZ};
