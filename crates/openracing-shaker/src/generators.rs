//! Signal generators
//!
//! Each generator maps one telemetry quantity onto a vibration frequency in the
//! shaker band `[MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ]`.
//!
//! # RT Safety
//!
//! - No heap allocations
//! - O(1) time complexity
//! - Pure functions, no shared state
//!
//! Aggregation over the four wheels stays in `f32`; the value is truncated to
//! whole Hz only after the final clamp.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SignalConfig;
use crate::error::GeneratorError;
use crate::telemetry::TelemetrySample;
use crate::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};

/// Identifies one of the virtual vibration signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Engine speed
    Rpm,
    /// Summed tire slip across all wheels
    TireSlip,
    /// Summed suspension travel across all wheels
    Suspension,
}

impl SignalKind {
    /// Number of signal kinds.
    pub const COUNT: usize = 3;

    /// All signal kinds in evaluation order.
    pub const ALL: [SignalKind; Self::COUNT] =
        [SignalKind::Rpm, SignalKind::TireSlip, SignalKind::Suspension];

    /// Stable snake_case name used in logs and config keys.
    pub const fn name(self) -> &'static str {
        match self {
            SignalKind::Rpm => "rpm",
            SignalKind::TireSlip => "tire_slip",
            SignalKind::Suspension => "suspension",
        }
    }

    /// The characteristic scalar this signal reduces a sample to.
    ///
    /// This is also the quantity the change tracker watches for staleness.
    pub fn aggregate(self, sample: &TelemetrySample) -> f32 {
        match self {
            SignalKind::Rpm => sample.rpm,
            SignalKind::TireSlip => total_tire_slip(&sample.tire_slip),
            SignalKind::Suspension => total_suspension_travel(&sample.suspension_height),
        }
    }

    /// Map an aggregate produced by [`SignalKind::aggregate`] to a frequency.
    pub fn frequency(
        self,
        aggregate: f32,
        signal: &SignalConfig,
        base_hz: u32,
    ) -> Result<u32, GeneratorError> {
        match self {
            SignalKind::Rpm => rpm_frequency(aggregate, signal.transfer),
            SignalKind::TireSlip | SignalKind::Suspension => {
                offset_frequency(self, aggregate, signal.transfer, base_hz)
            }
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sum of per-wheel deviation from perfect rolling contact.
///
/// A slip ratio of `1.0` means the wheel turns exactly at vehicle speed, so
/// four wheels at `1.0` reduce to `0.0`.
#[inline]
pub fn total_tire_slip(slip_ratios: &[f32; 4]) -> f32 {
    slip_ratios.iter().map(|slip| (slip - 1.0).abs()).sum()
}

/// Sum of absolute per-wheel suspension travel.
#[inline]
pub fn total_suspension_travel(heights: &[f32; 4]) -> f32 {
    heights.iter().map(|height| height.abs()).sum()
}

/// RPM generator: `clamp(rpm / divisor, 20, 90)`.
///
/// # Errors
///
/// [`GeneratorError::InvalidDivisor`] if `divisor` is not a positive finite
/// number, [`GeneratorError::NonFinite`] if `rpm` is not finite.
///
/// # Example
///
/// ```
/// use openracing_shaker::generators::rpm_frequency;
///
/// assert_eq!(rpm_frequency(3000.0, 75.0), Ok(40));
/// assert_eq!(rpm_frequency(0.0, 75.0), Ok(20));
/// assert_eq!(rpm_frequency(20_000.0, 75.0), Ok(90));
/// assert!(rpm_frequency(3000.0, 0.0).is_err());
/// ```
#[inline]
pub fn rpm_frequency(rpm: f32, divisor: f32) -> Result<u32, GeneratorError> {
    if !divisor.is_finite() || divisor <= 0.0 {
        return Err(GeneratorError::InvalidDivisor(divisor));
    }
    clamp_to_band(SignalKind::Rpm, rpm / divisor)
}

/// Tire-slip generator: `clamp(base + total_slip * factor, 20, 90)`.
#[inline]
pub fn tire_slip_frequency(
    slip_ratios: &[f32; 4],
    factor: f32,
    base_hz: u32,
) -> Result<u32, GeneratorError> {
    offset_frequency(
        SignalKind::TireSlip,
        total_tire_slip(slip_ratios),
        factor,
        base_hz,
    )
}

/// Suspension generator: `clamp(base + total_travel * factor, 20, 90)`.
#[inline]
pub fn suspension_frequency(
    heights: &[f32; 4],
    factor: f32,
    base_hz: u32,
) -> Result<u32, GeneratorError> {
    offset_frequency(
        SignalKind::Suspension,
        total_suspension_travel(heights),
        factor,
        base_hz,
    )
}

#[inline]
fn offset_frequency(
    kind: SignalKind,
    aggregate: f32,
    factor: f32,
    base_hz: u32,
) -> Result<u32, GeneratorError> {
    clamp_to_band(kind, base_hz as f32 + aggregate * factor)
}

/// Clamp a raw frequency into the shaker band and truncate to whole Hz.
#[inline]
fn clamp_to_band(kind: SignalKind, raw_hz: f32) -> Result<u32, GeneratorError> {
    if !raw_hz.is_finite() {
        return Err(GeneratorError::NonFinite(kind));
    }
    Ok(raw_hz.clamp(MIN_FREQUENCY_HZ as f32, MAX_FREQUENCY_HZ as f32) as u32)
}
