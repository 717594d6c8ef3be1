//! Frequency fusion
//!
//! Blends the frequencies of all enabled generators into the single value
//! sent to the oscillator. Each source contributes a `(frequency, weight)`
//! pair; adding a new source never changes the blending formula.

use serde::{Deserialize, Serialize};

/// One generator's vote in the blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contribution {
    /// Generator output in Hz
    pub frequency_hz: u32,
    /// Intensity weight, `0..=100`
    pub weight: u8,
}

impl Contribution {
    /// Create a contribution.
    pub const fn new(frequency_hz: u32, weight: u8) -> Self {
        Self {
            frequency_hz,
            weight,
        }
    }
}

/// Intensity-weighted mean of the contributions, truncated to whole Hz.
///
/// Returns `None` when there is nothing to average: no contributions, or
/// several whose weights sum to zero. A single contribution is returned
/// unchanged whatever its weight.
pub fn weighted_mean(contributions: &[Contribution]) -> Option<u32> {
    if let [single] = contributions {
        return Some(single.frequency_hz);
    }

    let (weighted_sum, weight_sum) =
        contributions
            .iter()
            .fold((0u64, 0u64), |(weighted, total), c| {
                let weight = u64::from(c.weight);
                (
                    weighted.saturating_add(u64::from(c.frequency_hz).saturating_mul(weight)),
                    total.saturating_add(weight),
                )
            });

    if weight_sum == 0 {
        return None;
    }

    u32::try_from(weighted_sum / weight_sum).ok()
}

/// Blend contributions, falling back to `normal_hz` when there is no signal.
///
/// # Example
///
/// ```
/// use openracing_shaker::fusion::{Contribution, fuse};
///
/// let blended = fuse(&[Contribution::new(40, 50), Contribution::new(60, 50)], 20);
/// assert_eq!(blended, 50);
///
/// assert_eq!(fuse(&[], 20), 20);
/// ```
pub fn fuse(contributions: &[Contribution], normal_hz: u32) -> u32 {
    weighted_mean(contributions).unwrap_or(normal_hz)
}
