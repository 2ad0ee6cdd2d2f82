//! Blocking, open-loop motion.
//!
//! `Driver` turns a distance or an angle into a wait time using the
//! calibration constants, starts the chassis, blocks for that long and stops.
//! There is no way to interrupt a move once it has started.

use core::fmt;

use embassy_time::Duration;
use embedded_hal::{delay::DelayNs, i2c::I2c};

use super::{
    chassis::{Chassis, DEFAULT_SPEED},
    i2c::DeviceError,
};
use crate::utils::{config::Calibration, math::kinematics::{DifferentialKinematics, Side}};

pub struct Driver<I2C, D> {
    chassis: Chassis<I2C, D>,
    delay: D,
    calibration: Calibration,
}

impl<I2C, D, E> Driver<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
    E: fmt::Debug,
{
    pub fn new(
        chassis: Chassis<I2C, D>,
        delay: D,
        calibration: Calibration,
    ) -> Self {
        Driver {
            chassis,
            delay,
            calibration,
        }
    }

    pub fn chassis(&mut self) -> &mut Chassis<I2C, D> {
        &mut self.chassis
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Replace the timing constants, e.g. after measuring a specific unit.
    pub fn set_calibration(
        &mut self,
        calibration: Calibration,
    ) {
        self.calibration = calibration;
    }

    pub fn stop(&mut self) -> Result<(), DeviceError<E>> {
        self.chassis.stop()
    }

    /// Drive `distance_cm` and stop. The direction is given by the sign of
    /// `speed` alone.
    ///
    /// Returns the time spent moving.
    pub fn drive(
        &mut self,
        distance_cm: f32,
        speed: f32,
    ) -> Result<Duration, DeviceError<E>> {
        let wait = DifferentialKinematics::drive_duration(
            self.calibration.k_distance,
            distance_cm,
            speed,
        )
        .ok_or(DeviceError::InvalidArgument("speed must be non-zero"))?;

        self.chassis.forward(speed)?;
        self.hold(wait)?;
        Ok(wait)
    }

    /// Turn `degrees` towards `direction` on an arc of `radius_cm` and stop.
    ///
    /// A zero speed or a negative radius fails with `InvalidArgument` before
    /// the motors move. Returns the time spent turning.
    pub fn turn(
        &mut self,
        direction: Side,
        degrees: f32,
        radius_cm: f32,
        speed: f32,
    ) -> Result<Duration, DeviceError<E>> {
        if !DifferentialKinematics::is_valid_radius(radius_cm) {
            return Err(DeviceError::InvalidArgument(
                "radius must not be negative",
            ));
        }
        let wait = self
            .chassis
            .kinematics()
            .turn_duration(self.calibration.k_angle, degrees, radius_cm, speed)
            .ok_or(DeviceError::InvalidArgument("speed must be non-zero"))?;

        self.chassis.turn(direction, speed, radius_cm)?;
        self.hold(wait)?;
        Ok(wait)
    }

    /// Left turn at the default speed.
    pub fn left(
        &mut self,
        degrees: f32,
        radius_cm: f32,
    ) -> Result<Duration, DeviceError<E>> {
        self.turn(Side::Left, degrees, radius_cm, DEFAULT_SPEED)
    }

    /// Right turn at the default speed.
    pub fn right(
        &mut self,
        degrees: f32,
        radius_cm: f32,
    ) -> Result<Duration, DeviceError<E>> {
        self.turn(Side::Right, degrees, radius_cm, DEFAULT_SPEED)
    }

    fn hold(
        &mut self,
        wait: Duration,
    ) -> Result<(), DeviceError<E>> {
        tracing::debug!(wait_ms = wait.as_millis(), "holding motion");
        let mut us = wait.as_micros();
        // DelayNs takes u32 microseconds
        while us > 0 {
            let chunk = us.min(u32::MAX as u64) as u32;
            self.delay.delay_us(chunk);
            us -= chunk as u64;
        }
        self.chassis.stop()
    }

    pub fn release(self) -> (Chassis<I2C, D>, D) {
        (self.chassis, self.delay)
    }
}
