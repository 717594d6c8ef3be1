//! Telemetry sources available from the command line

use std::path::Path;

use anyhow::{Context, Result};
use openracing_shaker::{ReplaySource, TelemetryError, TelemetrySample, TelemetrySource};

use crate::error::CliError;

/// Seconds spent parked in neutral before the synthetic drive pulls away.
const PARKED_SECS: f32 = 1.0;
/// Seconds spent in each gear.
const SECS_PER_GEAR: f32 = 3.0;
const TOP_GEAR: u64 = 6;
const IDLE_RPM: f32 = 900.0;
const SHIFT_RPM_LOW: f32 = 3500.0;
const SHIFT_RPM_SPAN: f32 = 3500.0;
/// Fraction of each gear with rear wheelspin after the shift.
const WHEELSPIN_PHASE: f32 = 0.1;
/// High nibble value meaning "no suggested gear".
const NO_SUGGESTION: u8 = 0x0F;

/// Load a JSON-lines telemetry recording.
///
/// Blank lines become gaps, undecodable lines become transient source errors.
pub fn load_recording(path: &Path) -> Result<ReplaySource> {
    if !path.exists() {
        return Err(CliError::TelemetryNotFound(path.display().to_string()).into());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read telemetry from {}", path.display()))?;
    let source = ReplaySource::from_json_lines(&text);
    tracing::info!(
        path = %path.display(),
        frames = source.remaining(),
        "Loaded telemetry recording"
    );
    Ok(source)
}

/// Deterministic drive through the gearbox.
///
/// Parks in neutral for a second, then climbs from first to sixth gear and
/// starts over, with a burst of rear wheelspin after every shift and a
/// gentle suspension ripple throughout.
#[derive(Debug, Clone)]
pub struct SyntheticDrive {
    tick: u64,
    total_ticks: u64,
    tick_ms: u64,
}

impl SyntheticDrive {
    /// Drive for `duration_ms`, producing one sample every `tick_ms`.
    pub fn new(duration_ms: u64, tick_ms: u64) -> Self {
        let tick_ms = tick_ms.max(1);
        Self {
            tick: 0,
            total_ticks: duration_ms / tick_ms,
            tick_ms,
        }
    }

    /// Samples still to be produced.
    pub fn remaining(&self) -> u64 {
        self.total_ticks.saturating_sub(self.tick)
    }

    /// The sample at `elapsed_secs` into the drive.
    pub fn sample_at(elapsed_secs: f32) -> TelemetrySample {
        if elapsed_secs < PARKED_SECS {
            return TelemetrySample {
                rpm: IDLE_RPM,
                gears: NO_SUGGESTION << 4,
                ..TelemetrySample::default()
            };
        }

        let driving = elapsed_secs - PARKED_SECS;
        let gear_index = (driving / SECS_PER_GEAR) as u64;
        let gear = (gear_index % TOP_GEAR + 1) as u8;
        let phase = (driving % SECS_PER_GEAR) / SECS_PER_GEAR;

        let suggested = if phase > 0.9 && u64::from(gear) < TOP_GEAR {
            gear + 1
        } else {
            NO_SUGGESTION
        };
        let rear_slip = if phase < WHEELSPIN_PHASE { 1.12 } else { 1.0 };
        let ripple = |offset: f32| 0.02 * (driving * 6.0 + offset).sin();

        TelemetrySample {
            speed_kmh: f32::from(gear) * 30.0 + phase * 25.0,
            rpm: SHIFT_RPM_LOW + phase * SHIFT_RPM_SPAN,
            gears: (suggested << 4) | gear,
            tire_slip: [1.0, 1.0, rear_slip, rear_slip],
            suspension_height: [ripple(0.0), ripple(0.5), ripple(1.0), ripple(1.5)],
        }
    }
}

impl TelemetrySource for SyntheticDrive {
    fn next_sample(&mut self) -> Result<Option<TelemetrySample>, TelemetryError> {
        if self.tick >= self.total_ticks {
            return Err(TelemetryError::Disconnected);
        }
        let elapsed_secs = (self.tick * self.tick_ms) as f32 / 1000.0;
        self.tick += 1;
        Ok(Some(Self::sample_at(elapsed_secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parked_at_start() {
        let sample = SyntheticDrive::sample_at(0.5);
        assert!(!sample.is_moving());
        assert_eq!(sample.current_gear(), 0);
        assert_eq!(sample.suggested_gear(), NO_SUGGESTION);
    }

    #[test]
    fn test_climbs_through_gears_and_wraps() {
        let gears: Vec<u8> = [1.5, 4.5, 7.5, 10.5, 13.5, 16.5, 19.5]
            .iter()
            .map(|&t| SyntheticDrive::sample_at(t).current_gear())
            .collect();
        assert_eq!(gears, vec![1, 2, 3, 4, 5, 6, 1]);
    }

    #[test]
    fn test_wheelspin_after_shift() {
        let spinning = SyntheticDrive::sample_at(PARKED_SECS + 0.1);
        assert!(spinning.tire_slip.get(2).is_some_and(|slip| *slip > 1.0));

        let gripping = SyntheticDrive::sample_at(PARKED_SECS + 1.5);
        assert_eq!(gripping.tire_slip, [1.0; 4]);
    }

    #[test]
    fn test_suggests_next_gear_near_redline() {
        let sample = SyntheticDrive::sample_at(PARKED_SECS + 2.9);
        assert_eq!(sample.current_gear(), 1);
        assert_eq!(sample.suggested_gear(), 2);
    }

    #[test]
    fn test_source_ends_with_disconnect() -> Result<(), Box<dyn std::error::Error>> {
        let mut drive = SyntheticDrive::new(30, 10);
        assert_eq!(drive.remaining(), 3);
        for _ in 0..3 {
            assert!(drive.next_sample()?.is_some());
        }
        assert_eq!(drive.next_sample(), Err(TelemetryError::Disconnected));
        Ok(())
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let drive = SyntheticDrive::new(5, 0);
        assert_eq!(drive.remaining(), 5);
    }

    #[test]
    fn test_missing_recording() {
        let err = load_recording(Path::new("/definitely/not/here.jsonl"));
        assert!(matches!(
            err.as_ref().map_err(|e| e.downcast_ref::<CliError>()),
            Err(Some(CliError::TelemetryNotFound(_)))
        ));
    }
}
