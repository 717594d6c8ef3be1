//! Snapshot tests for user-facing shaker messages and parameter listings

use openracing_shaker::prelude::*;

#[test]
fn test_out_of_range_message_snapshot() {
    let err = ShakerConfig::default().with_parameter("base_freq", "95");
    insta::assert_snapshot!(
        err.err().map(|e| e.to_string()).unwrap_or_default(),
        @"base_frequency_hz value 95 is out of range [20, 90]"
    );
}

#[test]
fn test_not_positive_message_snapshot() {
    let err = ShakerConfig::default().with_parameter("rpm_divisor", "0");
    insta::assert_snapshot!(
        err.err().map(|e| e.to_string()).unwrap_or_default(),
        @"rpm.transfer must be finite and greater than zero, got 0"
    );
}

#[test]
fn test_unknown_parameter_message_snapshot() {
    let err = ShakerConfig::default().with_parameter("freq_per_int", "5");
    insta::assert_snapshot!(
        err.err().map(|e| e.to_string()).unwrap_or_default(),
        @"Unknown parameter 'freq_per_int'"
    );
}

#[test]
fn test_invalid_flag_message_snapshot() {
    let err = ShakerConfig::default().with_parameter("use_rpm", "maybe");
    insta::assert_snapshot!(
        err.err().map(|e| e.to_string()).unwrap_or_default(),
        @"Invalid value 'maybe' for parameter 'use_rpm'"
    );
}

#[test]
fn test_disconnect_message_snapshot() {
    let err = ShakerError::from(TelemetryError::Disconnected);
    insta::assert_snapshot!(err.to_string(), @"Telemetry error: Telemetry source disconnected");
}

#[test]
fn test_default_parameters_snapshot() {
    let listing: Vec<String> = ShakerConfig::default()
        .parameters()
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    insta::assert_snapshot!(listing.join("\n"), @r"
    base_freq=20
    normal_freq=20
    gear_shift_freq=30
    gear_shift_dur=100
    stop_vibration_delay=5000
    use_rpm=true
    rpm_intensity=50
    rpm_divisor=75
    use_tire_slip=true
    tire_slip_intensity=50
    tire_slip_factor=70
    use_susp=false
    susp_intensity=50
    susp_factor=100
    ");
}

#[test]
fn test_gear_shift_timeline_snapshot() {
    let t0 = std::time::Instant::now();
    let mut config = ShakerConfig::default();
    config.rpm.enabled = false;
    config.tire_slip.enabled = false;
    let mut controller = VibrationController::new(t0);

    let timeline: Vec<String> = [(0u64, 1u8), (40, 1), (100, 1), (140, 2), (250, 2)]
        .iter()
        .map(|&(at, gear)| {
            let sample = TelemetrySample {
                speed_kmh: 50.0,
                gears: gear,
                ..TelemetrySample::default()
            };
            let now = t0 + std::time::Duration::from_millis(at);
            format!("{at}ms {:?}", controller.tick(Some(&sample), &config, now))
        })
        .collect();

    insta::assert_snapshot!(timeline.join("\n"), @r"
    0ms ShiftStarted { gear: 1, frequency_hz: 30 }
    40ms ShiftHolding { frequency_hz: 30 }
    100ms ShiftReleased { frequency_hz: 20 }
    140ms ShiftStarted { gear: 2, frequency_hz: 30 }
    250ms ShiftReleased { frequency_hz: 20 }
    ");
}
