//! Oscillator stand-in that records what the loop asked for

use std::collections::BTreeMap;

use openracing_shaker::{OscillatorSink, SILENT_HZ};
use serde::Serialize;
use tracing::debug;

/// Records every frequency written and how long each one was requested.
#[derive(Debug, Default, Clone, Serialize)]
pub struct OscillatorLog {
    /// Last frequency written
    pub current_hz: Option<u32>,
    /// Total writes, including repeats of the same frequency
    pub writes: u64,
    /// Writes that changed the frequency
    pub changes: u64,
    /// Writes per frequency
    pub histogram: BTreeMap<u32, u64>,
}

impl OscillatorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of writes that silenced the shaker.
    pub fn silent_ratio(&self) -> f64 {
        if self.writes == 0 {
            return 0.0;
        }
        let silent = self.histogram.get(&SILENT_HZ).copied().unwrap_or(0);
        silent as f64 / self.writes as f64
    }

    /// Most frequently requested frequency.
    pub fn dominant_hz(&self) -> Option<u32> {
        self.histogram
            .iter()
            .max_by_key(|&(hz, count)| (*count, std::cmp::Reverse(*hz)))
            .map(|(hz, _)| *hz)
    }
}

impl OscillatorSink for OscillatorLog {
    fn set_frequency(&mut self, hz: u32) {
        if self.current_hz != Some(hz) {
            debug!(from = ?self.current_hz, to = hz, "Oscillator frequency changed");
            self.changes += 1;
            self.current_hz = Some(hz);
        }
        self.writes += 1;
        *self.histogram.entry(hz).or_insert(0) += 1;
    }
}
