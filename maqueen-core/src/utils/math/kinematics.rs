//! Kinematics utilities for two-wheeled differential-drive robots.
//!
//! `DifferentialKinematics` maps a [`MotionIntent`] to a pair of signed wheel
//! speeds, and converts travel distances and turn angles into open-loop drive
//! durations using calibrated constants.
//!
//! # Example
//! ```rust
//! use maqueen_core::utils::math::kinematics::{DifferentialKinematics, MotionIntent, Side};
//! let kin = DifferentialKinematics::new(8.0);
//! let (left, right) = kin.wheel_speeds(MotionIntent::ArcTurn {
//!     side: Side::Right,
//!     speed: 50.0,
//!     radius_cm: 5.0,
//! });
//! assert_eq!(left, 50.0);
//! assert!((right - 250.0 / 13.0).abs() < 1e-4);
//! ```
use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Which side of the chassis, used both for wheels and turn directions.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Vocabulary of continuous motions the chassis understands.
///
/// Serialized as JSON with tag `"mi"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "mi", rename_all = "snake_case")]
pub enum MotionIntent {
    /// Both wheels at `speed`; negative drives backward.
    Forward { speed: f32 },
    /// Same as `Forward` with the sign flipped.
    Backward { speed: f32 },
    /// Outer wheel at `speed`, inner wheel slowed to follow a circle of
    /// `radius_cm` measured from the inner wheel. Zero radius pivots on the
    /// stopped inner wheel; a negative radius is not a valid arc.
    ArcTurn {
        side: Side,
        speed: f32,
        radius_cm: f32,
    },
    /// Spin in place: left at `speed`, right at `-speed`.
    Rotate { speed: f32 },
    Stop,
}

/// Wheel-speed mapping for a chassis with a fixed wheelbase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialKinematics {
    /// Distance between the wheels (cm), always positive.
    wheelbase_cm: f32,
}

impl DifferentialKinematics {
    /// Instantiate with the given wheelbase.
    ///
    /// Callers validate the wheelbase; see [`Self::try_new`].
    pub fn new(wheelbase_cm: f32) -> Self {
        Self { wheelbase_cm }
    }

    /// Instantiate, rejecting a wheelbase that is not a positive finite number.
    pub fn try_new(wheelbase_cm: f32) -> Option<Self> {
        (wheelbase_cm.is_finite() && wheelbase_cm > 0.0).then_some(Self { wheelbase_cm })
    }

    pub fn wheelbase_cm(&self) -> f32 {
        self.wheelbase_cm
    }

    /// Whether `radius_cm` describes an arc: finite and not negative.
    pub fn is_valid_radius(radius_cm: f32) -> bool {
        radius_cm.is_finite() && radius_cm >= 0.0
    }

    /// Speed of the inner wheel on an arc whose outer wheel runs at `speed`.
    ///
    /// `radius_cm` is expected to pass [`Self::is_valid_radius`].
    pub fn inner_wheel_speed(
        &self,
        speed: f32,
        radius_cm: f32,
    ) -> f32 {
        if radius_cm == 0.0 {
            return 0.0;
        }
        speed * radius_cm / (radius_cm + self.wheelbase_cm)
    }

    /// Signed `(left, right)` wheel speeds for `intent`. Values are not
    /// clamped to the motor range.
    pub fn wheel_speeds(
        &self,
        intent: MotionIntent,
    ) -> (f32, f32) {
        match intent {
            MotionIntent::Forward { speed } => (speed, speed),
            MotionIntent::Backward { speed } => (-speed, -speed),
            MotionIntent::ArcTurn {
                side: Side::Left,
                speed,
                radius_cm,
            } => (self.inner_wheel_speed(speed, radius_cm), speed),
            MotionIntent::ArcTurn {
                side: Side::Right,
                speed,
                radius_cm,
            } => (speed, self.inner_wheel_speed(speed, radius_cm)),
            MotionIntent::Rotate { speed } => (speed, -speed),
            MotionIntent::Stop => (0.0, 0.0),
        }
    }

    /// Time needed to cover `distance_cm` at `speed`: `k_distance * d / v` ms.
    ///
    /// Returns `None` for a zero or non-finite speed.
    pub fn drive_duration(
        k_distance: f32,
        distance_cm: f32,
        speed: f32,
    ) -> Option<Duration> {
        if speed == 0.0 || !speed.is_finite() {
            return None;
        }
        Some(millis_to_duration(k_distance * distance_cm / speed))
    }

    /// Time needed to turn `degrees` on an arc of `radius_cm` at `speed`:
    /// `(1 + r / wheelbase) * degrees * k_angle / v` ms.
    ///
    /// Returns `None` for a zero or non-finite speed.
    pub fn turn_duration(
        &self,
        k_angle: f32,
        degrees: f32,
        radius_cm: f32,
        speed: f32,
    ) -> Option<Duration> {
        if speed == 0.0 || !speed.is_finite() {
            return None;
        }
        let ms = (1.0 + radius_cm / self.wheelbase_cm) * degrees * k_angle / speed;
        Some(millis_to_duration(ms))
    }
}

/// Convert fractional milliseconds to a duration, rounded to the microsecond.
/// The sign is dropped; a non-finite value becomes zero.
fn millis_to_duration(ms: f32) -> Duration {
    let us = libm::roundf(libm::fabsf(ms) * 1000.0);
    if us.is_finite() {
        Duration::from_micros(us as u64)
    } else {
        Duration::from_micros(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_wheel_speed_formula() {
        let kin = DifferentialKinematics::new(8.0);
        for &r in &[0.5f32, 1.0, 5.0, 10.0, 100.0] {
            let inner = kin.inner_wheel_speed(60.0, r);
            assert!((inner - 60.0 * r / (r + 8.0)).abs() < 1e-4, "radius {}", r);
            assert!(inner > 0.0 && inner < 60.0);
        }
    }

    #[test]
    fn test_pivot_stops_inner_wheel() {
        let kin = DifferentialKinematics::new(8.0);
        let left_turn = MotionIntent::ArcTurn {
            side: Side::Left,
            speed: 50.0,
            radius_cm: 0.0,
        };
        assert_eq!(kin.wheel_speeds(left_turn), (0.0, 50.0));
    }

    #[test]
    fn test_rotate_is_antisymmetric() {
        let kin = DifferentialKinematics::new(8.0);
        for &s in &[-255.0f32, -12.5, 0.0, 33.0, 200.0] {
            let (l, r) = kin.wheel_speeds(MotionIntent::Rotate { speed: s });
            assert_eq!(l, s);
            assert_eq!(r, -s);
        }
    }

    #[test]
    fn test_backward_matches_negated_forward() {
        let kin = DifferentialKinematics::new(8.0);
        assert_eq!(
            kin.wheel_speeds(MotionIntent::Backward { speed: 70.0 }),
            kin.wheel_speeds(MotionIntent::Forward { speed: -70.0 })
        );
    }

    #[test]
    fn test_negative_speed_keeps_arc_ratio() {
        let kin = DifferentialKinematics::new(8.0);
        let (l, r) = kin.wheel_speeds(MotionIntent::ArcTurn {
            side: Side::Left,
            speed: -40.0,
            radius_cm: 8.0,
        });
        assert_eq!(r, -40.0);
        assert!((l + 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_radius_validity() {
        assert!(DifferentialKinematics::is_valid_radius(0.0));
        assert!(DifferentialKinematics::is_valid_radius(12.5));
        assert!(!DifferentialKinematics::is_valid_radius(-0.1));
        assert!(!DifferentialKinematics::is_valid_radius(f32::NAN));
        assert!(!DifferentialKinematics::is_valid_radius(f32::INFINITY));
    }

    #[test]
    fn test_try_new_rejects_bad_wheelbase() {
        assert!(DifferentialKinematics::try_new(0.0).is_none());
        assert!(DifferentialKinematics::try_new(-3.0).is_none());
        assert!(DifferentialKinematics::try_new(f32::NAN).is_none());
        assert!(DifferentialKinematics::try_new(8.0).is_some());
    }

    #[test]
    fn test_drive_duration() {
        let d = DifferentialKinematics::drive_duration(5000.0, 20.0, 50.0).unwrap();
        assert_eq!(d.as_millis(), 2000);
        assert!(DifferentialKinematics::drive_duration(5000.0, 20.0, 0.0).is_none());
        // reversing with a positive distance still waits the same time
        let back = DifferentialKinematics::drive_duration(5000.0, 20.0, -50.0).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_turn_duration_scales_with_radius() {
        let kin = DifferentialKinematics::new(8.0);
        let pivot = kin.turn_duration(500.0, 90.0, 0.0, 50.0).unwrap();
        assert_eq!(pivot.as_millis(), 900);
        let arc = kin.turn_duration(500.0, 90.0, 8.0, 50.0).unwrap();
        assert_eq!(arc.as_millis(), 1800);
        assert!(kin.turn_duration(500.0, 90.0, 0.0, 0.0).is_none());
    }
}
