//! Telemetry input for the shaker loop.
//!
//! The core does not own any transport. Packets are received and decrypted
//! upstream and arrive here as one [`TelemetrySample`] per tick through a
//! [`TelemetrySource`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TelemetryError;

/// Mask selecting the current gear from the raw gear byte.
pub const GEAR_MASK: u8 = 0x0F;

/// One decoded telemetry sample.
///
/// Wheel arrays are ordered front-left, front-right, rear-left, rear-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySample {
    /// Vehicle speed in km/h
    pub speed_kmh: f32,
    /// Engine speed in revolutions per minute
    pub rpm: f32,
    /// Raw gear byte: low nibble current gear, high nibble suggested gear
    pub gears: u8,
    /// Per-wheel slip ratio, `1.0` means no slip
    pub tire_slip: [f32; 4],
    /// Per-wheel suspension travel
    pub suspension_height: [f32; 4],
}

impl Default for TelemetrySample {
    fn default() -> Self {
        Self {
            speed_kmh: 0.0,
            rpm: 0.0,
            gears: 0,
            tire_slip: [1.0; 4],
            suspension_height: [0.0; 4],
        }
    }
}

impl TelemetrySample {
    /// Build a sample from a speed in metres per second, as most sims report it.
    pub fn with_speed_mps(mut self, speed_mps: f32) -> Self {
        self.speed_kmh = speed_mps * 3.6;
        self
    }

    /// Current gear, `0` is neutral.
    #[inline]
    pub fn current_gear(&self) -> u8 {
        decode_gear(self.gears)
    }

    /// Gear suggested by the sim, `15` when it has no suggestion.
    #[inline]
    pub fn suggested_gear(&self) -> u8 {
        self.gears >> 4
    }

    /// Whether the speed is strictly positive. Reverse and standstill both read as not moving.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.speed_kmh > 0.0
    }

    /// Reject samples carrying NaN or infinity.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::NonFinite`] naming the first offending field.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if !self.speed_kmh.is_finite() {
            return Err(TelemetryError::NonFinite("speed_kmh"));
        }
        if !self.rpm.is_finite() {
            return Err(TelemetryError::NonFinite("rpm"));
        }
        if !self.tire_slip.iter().all(|v| v.is_finite()) {
            return Err(TelemetryError::NonFinite("tire_slip"));
        }
        if !self.suspension_height.iter().all(|v| v.is_finite()) {
            return Err(TelemetryError::NonFinite("suspension_height"));
        }
        Ok(())
    }
}

/// Decode the current gear from the raw gear byte.
#[inline]
pub fn decode_gear(gears: u8) -> u8 {
    gears & GEAR_MASK
}

/// Supplies one sample per tick.
pub trait TelemetrySource {
    /// Fetch the sample for this tick.
    ///
    /// `Ok(None)` means nothing arrived this tick. Errors other than
    /// [`TelemetryError::Disconnected`] are transient and the loop holds its
    /// last output.
    ///
    /// # Errors
    ///
    /// Decoding failures, or [`TelemetryError::Disconnected`] when the
    /// source is exhausted.
    fn next_sample(&mut self) -> Result<Option<TelemetrySample>, TelemetryError>;
}

/// Source backed by a prerecorded queue of samples.
///
/// Gaps and decode failures are kept in the queue so a replay reproduces
/// the conditions of the recording.
#[derive(Debug, Default, Clone)]
pub struct ReplaySource {
    frames: VecDeque<Result<Option<TelemetrySample>, TelemetryError>>,
}

impl ReplaySource {
    /// Empty replay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay of consecutive good samples.
    pub fn from_samples(samples: impl IntoIterator<Item = TelemetrySample>) -> Self {
        Self {
            frames: samples.into_iter().map(|s| Ok(Some(s))).collect(),
        }
    }

    /// Parse a JSON-lines recording, one sample object per line.
    ///
    /// Blank lines become missing samples and lines that fail to decode
    /// become decode errors; neither aborts the parse.
    pub fn from_json_lines(text: &str) -> Self {
        let frames = text
            .lines()
            .enumerate()
            .map(|(index, line)| {
                let line = line.trim();
                if line.is_empty() {
                    return Ok(None);
                }
                serde_json::from_str::<TelemetrySample>(line)
                    .map(Some)
                    .map_err(|e| {
                        debug!(line = index + 1, error = %e, "Undecodable telemetry line");
                        TelemetryError::Decode(format!("line {}: {}", index + 1, e))
                    })
            })
            .collect();
        Self { frames }
    }

    /// Append a good sample.
    pub fn push(&mut self, sample: TelemetrySample) {
        self.frames.push_back(Ok(Some(sample)));
    }

    /// Append a tick with no sample.
    pub fn push_gap(&mut self) {
        self.frames.push_back(Ok(None));
    }

    /// Frames left to replay.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// Whether the replay is exhausted.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl TelemetrySource for ReplaySource {
    fn next_sample(&mut self) -> Result<Option<TelemetrySample>, TelemetryError> {
        self.frames
            .pop_front()
            .unwrap_or(Err(TelemetryError::Disconnected))
    }
}
