//! Shaker configuration
//!
//! [`ShakerConfig`] is an immutable snapshot. Administrative interfaces never
//! edit the live values; they build a new snapshot, validate it and swap it
//! into a [`ConfigHandle`]. The control loop takes one snapshot per tick, so
//! a tick can never observe half of an update.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::{ConfigError, ShakerResult};
use crate::generators::SignalKind;
use crate::{MAX_FREQUENCY_HZ, MAX_INTENSITY, MIN_FREQUENCY_HZ};

/// Default frequency offset for the slip and suspension generators.
pub const DEFAULT_BASE_FREQUENCY_HZ: u32 = 20;
/// Default frequency used when no signal contributes and after a gear shift.
pub const DEFAULT_NORMAL_FREQUENCY_HZ: u32 = 20;
/// Default gear-shift kick frequency.
pub const DEFAULT_GEAR_SHIFT_FREQUENCY_HZ: u32 = 30;
/// Default gear-shift kick duration.
pub const DEFAULT_GEAR_SHIFT_DURATION_MS: u64 = 100;
/// Default time without any telemetry movement before the shaker is muted.
pub const DEFAULT_STOP_VIBRATION_DELAY_MS: u64 = 5000;
/// Longest gear-shift kick accepted.
pub const MAX_GEAR_SHIFT_DURATION_MS: u64 = 2000;

/// Names accepted by [`ShakerConfig::with_parameter`].
pub const PARAMETER_NAMES: &[&str] = &[
    "base_freq",
    "normal_freq",
    "gear_shift_freq",
    "gear_shift_dur",
    "stop_vibration_delay",
    "use_rpm",
    "rpm_intensity",
    "rpm_divisor",
    "use_tire_slip",
    "tire_slip_intensity",
    "tire_slip_factor",
    "use_susp",
    "susp_intensity",
    "susp_factor",
];

/// Settings for one virtual vibration signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Whether the signal takes part in fusion
    pub enabled: bool,
    /// Weight in the blend, `0..=100`
    pub intensity: u8,
    /// Transfer parameter: the divisor for RPM, Hz per unit for slip and suspension
    pub transfer: f32,
}

impl SignalConfig {
    /// Create a signal config.
    pub const fn new(enabled: bool, intensity: u8, transfer: f32) -> Self {
        Self {
            enabled,
            intensity,
            transfer,
        }
    }

    /// RPM defaults: enabled, half intensity, `rpm / 75`.
    pub const fn rpm() -> Self {
        Self::new(true, 50, 75.0)
    }

    /// Tire-slip defaults: enabled, half intensity, 70 Hz per unit of slip.
    pub const fn tire_slip() -> Self {
        Self::new(true, 50, 70.0)
    }

    /// Suspension defaults: disabled, half intensity, 100 Hz per unit of travel.
    pub const fn suspension() -> Self {
        Self::new(false, 50, 100.0)
    }

    fn validate(&self, kind: SignalKind) -> Result<(), ConfigError> {
        if self.intensity > MAX_INTENSITY {
            return Err(ConfigError::out_of_range(
                intensity_field(kind),
                self.intensity,
                0,
                MAX_INTENSITY,
            ));
        }
        match kind {
            SignalKind::Rpm => {
                if !self.transfer.is_finite() || self.transfer <= 0.0 {
                    return Err(ConfigError::not_positive("rpm.transfer", self.transfer));
                }
            }
            SignalKind::TireSlip | SignalKind::Suspension => {
                if !self.transfer.is_finite() || self.transfer < 0.0 {
                    return Err(ConfigError::out_of_range(
                        transfer_field(kind),
                        self.transfer,
                        0,
                        f32::MAX,
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A signal block as written in a config file; absent fields are `None`.
#[derive(Debug, Deserialize)]
struct PartialSignal {
    enabled: Option<bool>,
    intensity: Option<u8>,
    transfer: Option<f32>,
}

impl PartialSignal {
    fn merge_onto(self, defaults: SignalConfig) -> SignalConfig {
        SignalConfig {
            enabled: self.enabled.unwrap_or(defaults.enabled),
            intensity: self.intensity.unwrap_or(defaults.intensity),
            transfer: self.transfer.unwrap_or(defaults.transfer),
        }
    }
}

fn rpm_signal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SignalConfig, D::Error> {
    PartialSignal::deserialize(deserializer).map(|raw| raw.merge_onto(SignalConfig::rpm()))
}

fn tire_slip_signal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<SignalConfig, D::Error> {
    PartialSignal::deserialize(deserializer).map(|raw| raw.merge_onto(SignalConfig::tire_slip()))
}

fn suspension_signal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<SignalConfig, D::Error> {
    PartialSignal::deserialize(deserializer).map(|raw| raw.merge_onto(SignalConfig::suspension()))
}

fn intensity_field(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::Rpm => "rpm.intensity",
        SignalKind::TireSlip => "tire_slip.intensity",
        SignalKind::Suspension => "suspension.intensity",
    }
}

fn transfer_field(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::Rpm => "rpm.transfer",
        SignalKind::TireSlip => "tire_slip.transfer",
        SignalKind::Suspension => "suspension.transfer",
    }
}

/// Gear-shift kick settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearShiftConfig {
    /// Frequency held while the kick is active
    pub frequency_hz: u32,
    /// Kick duration in milliseconds
    pub duration_ms: u64,
}

impl Default for GearShiftConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_GEAR_SHIFT_FREQUENCY_HZ,
            duration_ms: DEFAULT_GEAR_SHIFT_DURATION_MS,
        }
    }
}

impl GearShiftConfig {
    /// Kick duration.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Complete configuration snapshot read once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakerConfig {
    /// Offset added by the slip and suspension generators
    pub base_frequency_hz: u32,
    /// Fallback when nothing contributes, and the post-shift frequency
    pub normal_frequency_hz: u32,
    /// Gear-shift kick
    pub gear_shift: GearShiftConfig,
    /// Mute after this long without any monitored quantity changing
    pub stop_vibration_delay_ms: u64,
    /// Engine speed signal
    #[serde(deserialize_with = "rpm_signal")]
    pub rpm: SignalConfig,
    /// Tire slip signal
    #[serde(deserialize_with = "tire_slip_signal")]
    pub tire_slip: SignalConfig,
    /// Suspension travel signal
    #[serde(deserialize_with = "suspension_signal")]
    pub suspension: SignalConfig,
}

impl Default for ShakerConfig {
    fn default() -> Self {
        Self {
            base_frequency_hz: DEFAULT_BASE_FREQUENCY_HZ,
            normal_frequency_hz: DEFAULT_NORMAL_FREQUENCY_HZ,
            gear_shift: GearShiftConfig::default(),
            stop_vibration_delay_ms: DEFAULT_STOP_VIBRATION_DELAY_MS,
            rpm: SignalConfig::rpm(),
            tire_slip: SignalConfig::tire_slip(),
            suspension: SignalConfig::suspension(),
        }
    }
}

impl ShakerConfig {
    /// Settings of one signal.
    pub fn signal(&self, kind: SignalKind) -> &SignalConfig {
        match kind {
            SignalKind::Rpm => &self.rpm,
            SignalKind::TireSlip => &self.tire_slip,
            SignalKind::Suspension => &self.suspension,
        }
    }

    /// Signals currently taking part in fusion.
    pub fn enabled_signals(&self) -> impl Iterator<Item = SignalKind> + '_ {
        SignalKind::ALL
            .into_iter()
            .filter(|kind| self.signal(*kind).enabled)
    }

    /// Staleness delay.
    pub fn stop_vibration_delay(&self) -> Duration {
        Duration::from_millis(self.stop_vibration_delay_ms)
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// The first violation found, as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_band("base_frequency_hz", self.base_frequency_hz)?;
        check_band("normal_frequency_hz", self.normal_frequency_hz)?;
        check_band("gear_shift.frequency_hz", self.gear_shift.frequency_hz)?;
        if self.gear_shift.duration_ms > MAX_GEAR_SHIFT_DURATION_MS {
            return Err(ConfigError::out_of_range(
                "gear_shift.duration_ms",
                self.gear_shift.duration_ms,
                0,
                MAX_GEAR_SHIFT_DURATION_MS,
            ));
        }
        for kind in SignalKind::ALL {
            self.signal(kind).validate(kind)?;
        }
        Ok(())
    }

    /// Return a copy with one named parameter changed, validated.
    ///
    /// Names follow the device settings form (`base_freq`,
    /// `gear_shift_freq`, `gear_shift_dur`, ...); see [`PARAMETER_NAMES`].
    /// Booleans accept `true`/`false`, `1`/`0` and `on`/`off`.
    ///
    /// # Errors
    ///
    /// Unknown names, unparsable values and values failing [`Self::validate`].
    ///
    /// # Example
    ///
    /// ```
    /// use openracing_shaker::ShakerConfig;
    ///
    /// let config = ShakerConfig::default().with_parameter("gear_shift_freq", "45")?;
    /// assert_eq!(config.gear_shift.frequency_hz, 45);
    /// assert!(config.with_parameter("rpm_divisor", "0").is_err());
    /// # Ok::<(), openracing_shaker::ConfigError>(())
    /// ```
    pub fn with_parameter(&self, name: &str, value: &str) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        match name {
            "base_freq" => next.base_frequency_hz = parse_value(name, value)?,
            "normal_freq" => next.normal_frequency_hz = parse_value(name, value)?,
            "gear_shift_freq" => next.gear_shift.frequency_hz = parse_value(name, value)?,
            "gear_shift_dur" => next.gear_shift.duration_ms = parse_value(name, value)?,
            "stop_vibration_delay" => next.stop_vibration_delay_ms = parse_value(name, value)?,
            "use_rpm" => next.rpm.enabled = parse_flag(name, value)?,
            "rpm_intensity" => next.rpm.intensity = parse_value(name, value)?,
            "rpm_divisor" => next.rpm.transfer = parse_value(name, value)?,
            "use_tire_slip" => next.tire_slip.enabled = parse_flag(name, value)?,
            "tire_slip_intensity" => next.tire_slip.intensity = parse_value(name, value)?,
            "tire_slip_factor" => next.tire_slip.transfer = parse_value(name, value)?,
            "use_susp" => next.suspension.enabled = parse_flag(name, value)?,
            "susp_intensity" => next.suspension.intensity = parse_value(name, value)?,
            "susp_factor" => next.suspension.transfer = parse_value(name, value)?,
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        }
        next.validate()?;
        Ok(next)
    }

    /// Current value of every named parameter, in [`PARAMETER_NAMES`] order.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("base_freq", self.base_frequency_hz.to_string()),
            ("normal_freq", self.normal_frequency_hz.to_string()),
            ("gear_shift_freq", self.gear_shift.frequency_hz.to_string()),
            ("gear_shift_dur", self.gear_shift.duration_ms.to_string()),
            (
                "stop_vibration_delay",
                self.stop_vibration_delay_ms.to_string(),
            ),
            ("use_rpm", self.rpm.enabled.to_string()),
            ("rpm_intensity", self.rpm.intensity.to_string()),
            ("rpm_divisor", self.rpm.transfer.to_string()),
            ("use_tire_slip", self.tire_slip.enabled.to_string()),
            ("tire_slip_intensity", self.tire_slip.intensity.to_string()),
            ("tire_slip_factor", self.tire_slip.transfer.to_string()),
            ("use_susp", self.suspension.enabled.to_string()),
            ("susp_intensity", self.suspension.intensity.to_string()),
            ("susp_factor", self.suspension.transfer.to_string()),
        ]
    }

    /// Parse and validate a YAML document. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or a validation error.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or a validation error.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, JSON when the extension is `.json`, YAML otherwise.
    ///
    /// # Errors
    ///
    /// I/O failures, parse failures and validation failures.
    pub fn load(path: &Path) -> ShakerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = if is_json(path) {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        Ok(config)
    }

    /// Serialize as YAML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if serialization fails.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize as pretty JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Write the config to `path`, format chosen like [`Self::load`].
    ///
    /// # Errors
    ///
    /// Serialization or I/O failures.
    pub fn save(&self, path: &Path) -> ShakerResult<()> {
        let text = if is_json(path) {
            self.to_json_string()?
        } else {
            self.to_yaml_string()?
        };
        std::fs::write(path, text)?;
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn check_band(field: &'static str, hz: u32) -> Result<(), ConfigError> {
    if (MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&hz) {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(
            field,
            hz,
            MIN_FREQUENCY_HZ,
            MAX_FREQUENCY_HZ,
        ))
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Shared, swappable configuration.
///
/// Writers replace the whole snapshot; readers clone the inner `Arc`, so the
/// read lock is held only for a reference-count bump.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<ShakerConfig>>>,
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(ShakerConfig::default()))),
        }
    }
}

impl ConfigHandle {
    /// Wrap a validated config.
    ///
    /// # Errors
    ///
    /// Validation errors from [`ShakerConfig::validate`].
    pub fn new(config: ShakerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        })
    }

    /// The snapshot currently in effect.
    pub fn snapshot(&self) -> Arc<ShakerConfig> {
        Arc::clone(&self.inner.read())
    }

    /// Validate and swap in a complete new config.
    ///
    /// # Errors
    ///
    /// Validation errors; the active snapshot is left untouched.
    pub fn replace(&self, config: ShakerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.inner.write() = Arc::new(config);
        info!("Shaker configuration replaced");
        Ok(())
    }

    /// Apply one named parameter to the active snapshot and swap the result in.
    ///
    /// The write lock is held across read-modify-write so concurrent updates
    /// are not lost.
    ///
    /// # Errors
    ///
    /// See [`ShakerConfig::with_parameter`].
    pub fn set_parameter(&self, name: &str, value: &str) -> Result<Arc<ShakerConfig>, ConfigError> {
        let mut guard = self.inner.write();
        let next = Arc::new(guard.with_parameter(name, value)?);
        *guard = Arc::clone(&next);
        info!(parameter = name, value = value, "Shaker parameter updated");
        Ok(next)
    }
}
