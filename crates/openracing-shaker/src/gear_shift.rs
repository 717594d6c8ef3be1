//! Gear-shift override
//!
//! A gear change produces a short kick at a fixed frequency that takes
//! priority over everything else the controller would output. The kick is
//! timed with a deadline checked on every tick, so the loop never sleeps.
//!
//! ```text
//!            gear differs from previous
//!   Normal ────────────────────────────▶ ShiftTransient { until }
//!     ▲                                      │   │
//!     │   now >= until (emit normal freq)    │   │ gear differs again
//!     └──────────────────────────────────────┘   └──▶ restart with new deadline
//! ```

use std::time::Instant;

use tracing::info;

use crate::config::GearShiftConfig;
use crate::telemetry::decode_gear;

/// Override state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftPhase {
    /// No kick in progress
    #[default]
    Normal,
    /// Kick active until the deadline
    ShiftTransient {
        /// Instant at which the kick ends
        until: Instant,
    },
}

/// What the override wants the oscillator to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOutput {
    /// A gear change was detected this tick.
    Started {
        /// Newly engaged gear
        gear: u8,
        /// Kick frequency
        frequency_hz: u32,
    },
    /// The kick is still running.
    Holding {
        /// Kick frequency
        frequency_hz: u32,
    },
    /// The kick just ended; the oscillator returns to the normal frequency.
    Released {
        /// Post-shift frequency
        frequency_hz: u32,
    },
}

impl ShiftOutput {
    /// Frequency to put on the oscillator.
    pub fn frequency_hz(&self) -> u32 {
        match *self {
            ShiftOutput::Started { frequency_hz, .. }
            | ShiftOutput::Holding { frequency_hz }
            | ShiftOutput::Released { frequency_hz } => frequency_hz,
        }
    }
}

/// Gear-change detector and kick timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GearShiftOverride {
    previous_gear: u8,
    phase: ShiftPhase,
}

impl GearShiftOverride {
    /// Start in `Normal` with neutral as the previous gear.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start in `Normal` assuming `gear` is already engaged.
    pub fn with_gear(gear: u8) -> Self {
        Self {
            previous_gear: decode_gear(gear),
            phase: ShiftPhase::Normal,
        }
    }

    /// Feed the raw gear byte for this tick.
    ///
    /// Returns `Some` while the override owns the oscillator, `None` when the
    /// controller may run fusion.
    pub fn observe(
        &mut self,
        gears: u8,
        now: Instant,
        config: &GearShiftConfig,
        normal_hz: u32,
    ) -> Option<ShiftOutput> {
        let gear = decode_gear(gears);
        if gear != self.previous_gear {
            info!(
                from = self.previous_gear,
                to = gear,
                frequency_hz = config.frequency_hz,
                duration_ms = config.duration_ms,
                "Gear change detected"
            );
            self.previous_gear = gear;
            let until = now.checked_add(config.duration()).unwrap_or(now);
            self.phase = ShiftPhase::ShiftTransient { until };
            return Some(ShiftOutput::Started {
                gear,
                frequency_hz: config.frequency_hz,
            });
        }

        match self.phase {
            ShiftPhase::Normal => None,
            ShiftPhase::ShiftTransient { until } if now < until => Some(ShiftOutput::Holding {
                frequency_hz: config.frequency_hz,
            }),
            ShiftPhase::ShiftTransient { .. } => {
                self.phase = ShiftPhase::Normal;
                Some(ShiftOutput::Released {
                    frequency_hz: normal_hz,
                })
            }
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ShiftPhase {
        self.phase
    }

    /// Whether a kick is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, ShiftPhase::ShiftTransient { .. })
    }

    /// Last gear seen.
    pub fn previous_gear(&self) -> u8 {
        self.previous_gear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_no_change_stays_normal() {
        let t0 = Instant::now();
        let mut shift = GearShiftOverride::with_gear(2);
        let config = GearShiftConfig::default();

        assert_eq!(shift.observe(2, t0, &config, 20), None);
        assert_eq!(shift.phase(), ShiftPhase::Normal);
    }

    #[test]
    fn test_initial_gear_is_neutral() {
        let t0 = Instant::now();
        let mut shift = GearShiftOverride::new();
        let config = GearShiftConfig::default();

        assert_eq!(shift.observe(0, t0, &config, 20), None);
        assert!(matches!(
            shift.observe(1, t0, &config, 20),
            Some(ShiftOutput::Started { gear: 1, .. })
        ));
    }

    #[test]
    fn test_shift_kick_then_release() {
        let t0 = Instant::now();
        let mut shift = GearShiftOverride::with_gear(2);
        let config = GearShiftConfig::default();

        assert_eq!(
            shift.observe(3, t0, &config, 20),
            Some(ShiftOutput::Started {
                gear: 3,
                frequency_hz: 30
            })
        );
        assert!(shift.is_active());
        assert_eq!(
            shift.observe(3, t0 + ms(99), &config, 20),
            Some(ShiftOutput::Holding { frequency_hz: 30 })
        );
        assert_eq!(
            shift.observe(3, t0 + ms(100), &config, 20),
            Some(ShiftOutput::Released { frequency_hz: 20 })
        );
        assert!(!shift.is_active());
        assert_eq!(shift.observe(3, t0 + ms(110), &config, 20), None);
    }

    #[test]
    fn test_shift_to_neutral_triggers() {
        let t0 = Instant::now();
        let mut shift = GearShiftOverride::with_gear(4);
        let config = GearShiftConfig::default();

        assert!(matches!(
            shift.observe(0, t0, &config, 20),
            Some(ShiftOutput::Started { gear: 0, .. })
        ));
        assert_eq!(shift.previous_gear(), 0);
    }

    #[test]
    fn test_retrigger_mid_shift_restarts_deadline() {
        let t0 = Instant::now();
        let mut shift = GearShiftOverride::with_gear(2);
        let config = GearShiftConfig::default();

        shift.observe(3, t0, &config, 20);
        shift.observe(4, t0 + ms(60), &config, 20);

        // First deadline passed, restarted one has not
        assert_eq!(
            shift.observe(4, t0 + ms(120), &config, 20),
            Some(ShiftOutput::Holding { frequency_hz: 30 })
        );
        assert_eq!(
            shift.observe(4, t0 + ms(160), &config, 20),
            Some(ShiftOutput::Released { frequency_hz: 20 })
        );
    }

    #[test]
    fn test_suggested_gear_nibble_is_ignored() {
        let t0 = Instant::now();
        let mut shift = GearShiftOverride::with_gear(0x32);
        let config = GearShiftConfig::default();

        // Only the suggested gear (high nibble) changes
        assert_eq!(shift.observe(0x52, t0, &config, 20), None);
    }

    #[test]
    fn test_zero_duration_releases_next_tick() {
        let t0 = Instant::now();
        let mut shift = GearShiftOverride::with_gear(1);
        let config = GearShiftConfig {
            frequency_hz: 30,
            duration_ms: 0,
        };

        assert!(matches!(
            shift.observe(2, t0, &config, 25),
            Some(ShiftOutput::Started { .. })
        ));
        assert_eq!(
            shift.observe(2, t0, &config, 25),
            Some(ShiftOutput::Released { frequency_hz: 25 })
        );
    }

    #[test]
    fn test_output_frequency_accessor() {
        assert_eq!(
            ShiftOutput::Started {
                gear: 1,
                frequency_hz: 30
            }
            .frequency_hz(),
            30
        );
        assert_eq!(ShiftOutput::Released { frequency_hz: 20 }.frequency_hz(), 20);
    }
}
