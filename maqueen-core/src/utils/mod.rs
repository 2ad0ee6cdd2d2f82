//! Utility re-exports for the Maqueen robot.
//!
//! - `config`: wheelbase, calibration and timing settings
//! - `controllers`: motor bus, chassis, blocking driver, sensors and LEDs
//! - `math`: differential-drive kinematics and move durations

pub mod config;
pub mod controllers;
pub mod math;

pub use config::RobotConfig;
pub use controllers::{Robot, RobotCommand};
pub use embassy_time::Duration;
pub use math::kinematics::{DifferentialKinematics, MotionIntent, Side};
