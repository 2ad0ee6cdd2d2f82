//! Robot configuration.
//!
//! All physical dimensions and empirically tuned calibration values live here
//! so they can be adjusted per unit without touching the control code. Every
//! struct deserializes with `#[serde(default)]`, so a partial config only
//! overrides the fields it names.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Lateral distance between the two drive wheels of a stock Maqueen (cm).
pub const DEFAULT_WHEELBASE_CM: f32 = 8.0;

/// Top-level configuration for a [`Robot`](crate::utils::controllers::Robot).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Distance between the wheels in centimeters. Must be positive.
    pub wheelbase_cm: f32,
    pub calibration: Calibration,
    pub motor_bus: MotorBusConfig,
    pub ranging: RangingConfig,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            wheelbase_cm: DEFAULT_WHEELBASE_CM,
            calibration: Calibration::default(),
            motor_bus: MotorBusConfig::default(),
            ranging: RangingConfig::default(),
        }
    }
}

/// Open-loop timing constants for the blocking motion primitives.
///
/// `drive` waits `k_distance * cm / speed` milliseconds and `turn` waits
/// `(1 + radius / wheelbase) * degrees * k_angle / speed` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub k_distance: f32,
    pub k_angle: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            k_distance: 5000.0,
            k_angle: 500.0,
        }
    }
}

/// Connection establishment policy for the motor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorBusConfig {
    /// Total time budget for finding the controller on the bus.
    pub connect_timeout_ms: u32,
    /// Pause between two presence checks.
    pub poll_interval_ms: u32,
}

impl MotorBusConfig {
    /// Number of presence checks the timeout budget allows (never zero).
    pub fn connect_attempts(&self) -> u32 {
        self.attempts_within(self.connect_timeout())
    }

    /// Number of presence checks that fit in `timeout` (never zero).
    pub fn attempts_within(
        &self,
        timeout: Duration,
    ) -> u32 {
        let poll_ms = self.poll_interval().as_millis().max(1);
        (timeout.as_millis() / poll_ms).clamp(1, u32::MAX as u64) as u32
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms as u64)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms as u64)
    }
}

impl Default for MotorBusConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            poll_interval_ms: 50,
        }
    }
}

/// Timing of one ultrasonic ranging cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangingConfig {
    /// Longest echo pulse accepted; roughly 5 m of round trip.
    pub timeout_us: u32,
    /// Width of the trigger pulse.
    pub trigger_pulse_us: u32,
    /// Quiet time between two cycles so stale echoes die out.
    pub retry_delay_ms: u32,
    /// Centimeters per microsecond of echo (half the speed of sound).
    pub cm_per_us: f32,
}

impl RangingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_micros(self.timeout_us as u64)
    }
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self {
            timeout_us: 30_000,
            trigger_pulse_us: 10,
            retry_delay_ms: 100,
            cm_per_us: 0.017,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_twenty_checks_per_second() {
        let bus = MotorBusConfig::default();
        assert_eq!(bus.connect_attempts(), 20);
        assert_eq!(bus.connect_timeout().as_millis(), 1000);
    }

    #[test]
    fn budget_never_drops_to_zero() {
        let bus = MotorBusConfig {
            connect_timeout_ms: 10,
            poll_interval_ms: 50,
        };
        assert_eq!(bus.connect_attempts(), 1);

        let no_interval = MotorBusConfig {
            connect_timeout_ms: 3,
            poll_interval_ms: 0,
        };
        assert_eq!(no_interval.connect_attempts(), 3);
    }

    #[test]
    fn explicit_timeout_overrides_configured_budget() {
        let bus = MotorBusConfig::default();
        assert_eq!(bus.attempts_within(Duration::from_millis(200)), 4);
        assert_eq!(bus.attempts_within(Duration::from_millis(0)), 1);
        assert_eq!(bus.attempts_within(Duration::from_secs(5)), 100);
    }

    #[test]
    fn ranging_defaults() {
        let r = RangingConfig::default();
        assert_eq!(r.timeout().as_micros(), 30_000);
        assert_eq!(r.trigger_pulse_us, 10);
        assert_eq!(r.retry_delay_ms, 100);
        assert!((r.cm_per_us - 0.017).abs() < 1e-9);
    }
}
