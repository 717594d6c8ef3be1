//! Change tracking for staleness detection
//!
//! The tracker remembers the last value of every monitored quantity and a
//! single shared "last changed" instant. A change in any quantity refreshes
//! the shared clock; when nothing has moved for longer than the configured
//! delay the controller mutes the shaker.

use std::time::{Duration, Instant};

use crate::generators::SignalKind;

/// Last observed values and the shared change clock.
#[derive(Debug, Clone, Copy)]
pub struct ChangeTracker {
    last_rpm: f32,
    last_tire_slip: f32,
    last_suspension: f32,
    last_change: Instant,
}

impl ChangeTracker {
    /// Start tracking with all quantities at zero and the clock at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            last_rpm: 0.0,
            last_tire_slip: 0.0,
            last_suspension: 0.0,
            last_change: now,
        }
    }

    /// Record `value` for `kind`, returning whether it differs from the last one.
    ///
    /// Comparison is exact; telemetry arrives as discrete samples, so any
    /// bit-level difference counts as movement.
    pub fn observe(&mut self, kind: SignalKind, value: f32, now: Instant) -> bool {
        let slot = self.slot_mut(kind);
        if slot.to_bits() == value.to_bits() {
            return false;
        }
        *slot = value;
        self.last_change = now;
        true
    }

    /// Last value recorded for `kind`.
    pub fn last_value(&self, kind: SignalKind) -> f32 {
        match kind {
            SignalKind::Rpm => self.last_rpm,
            SignalKind::TireSlip => self.last_tire_slip,
            SignalKind::Suspension => self.last_suspension,
        }
    }

    /// Instant of the most recent change in any quantity.
    pub fn last_change(&self) -> Instant {
        self.last_change
    }

    /// Time since the most recent change, zero if `now` precedes it.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_change)
    }

    /// Whether nothing has changed for strictly longer than `delay`.
    pub fn is_stale(&self, now: Instant, delay: Duration) -> bool {
        self.idle_for(now) > delay
    }

    /// Forget all values and restart the clock.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    fn slot_mut(&mut self, kind: SignalKind) -> &mut f32 {
        match kind {
            SignalKind::Rpm => &mut self.last_rpm,
            SignalKind::TireSlip => &mut self.last_tire_slip,
            SignalKind::Suspension => &mut self.last_suspension,
        }
    }
}
