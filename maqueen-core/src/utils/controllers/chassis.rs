//! Continuous (non-blocking) differential-drive control.
//!
//! Every method writes the new wheel speeds and returns at once; the wheels
//! keep turning until the next command. Call [`Chassis::stop`] eventually.

use core::fmt;

use embedded_hal::{delay::DelayNs, i2c::I2c};

use super::i2c::{DeviceError, MotorBus, WheelChannel};
use crate::utils::{
    config::MotorBusConfig,
    math::kinematics::{DifferentialKinematics, MotionIntent, Side},
};

/// Speed used by the convenience motions when none is given.
pub const DEFAULT_SPEED: f32 = 50.0;

/// The two wheels, the motor bus they share and the wheelbase.
pub struct Chassis<I2C, D> {
    bus: MotorBus<I2C, D>,
    left: WheelChannel,
    right: WheelChannel,
    kinematics: DifferentialKinematics,
}

impl<I2C, D, E> Chassis<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
    E: fmt::Debug,
{
    /// Build a chassis over `i2c`.
    ///
    /// Fails with `InvalidArgument` unless `wheelbase_cm` is positive and
    /// finite. No bus traffic happens here.
    pub fn new(
        i2c: I2C,
        delay: D,
        wheelbase_cm: f32,
        bus_config: MotorBusConfig,
    ) -> Result<Self, DeviceError<E>> {
        let kinematics = DifferentialKinematics::try_new(wheelbase_cm)
            .ok_or(DeviceError::InvalidArgument("wheelbase must be positive"))?;
        Ok(Chassis {
            bus: MotorBus::new(i2c, delay, bus_config),
            left: WheelChannel::left(),
            right: WheelChannel::right(),
            kinematics,
        })
    }

    pub fn wheelbase_cm(&self) -> f32 {
        self.kinematics.wheelbase_cm()
    }

    pub fn kinematics(&self) -> &DifferentialKinematics {
        &self.kinematics
    }

    pub fn left_wheel(&self) -> &WheelChannel {
        &self.left
    }

    pub fn right_wheel(&self) -> &WheelChannel {
        &self.right
    }

    pub fn bus(&self) -> &MotorBus<I2C, D> {
        &self.bus
    }

    /// Establish the motor connection ahead of the first command.
    pub fn connect(&mut self) -> Result<(), DeviceError<E>> {
        self.bus.connect()
    }

    /// Compute the wheel speeds for `intent` and send them, left first.
    ///
    /// An arc with a negative or non-finite radius is rejected with
    /// `InvalidArgument` before anything is written.
    pub fn apply(
        &mut self,
        intent: MotionIntent,
    ) -> Result<(), DeviceError<E>> {
        if let MotionIntent::ArcTurn { radius_cm, .. } = intent {
            if !DifferentialKinematics::is_valid_radius(radius_cm) {
                return Err(DeviceError::InvalidArgument(
                    "radius must not be negative",
                ));
            }
        }
        let (left, right) = self.kinematics.wheel_speeds(intent);
        tracing::debug!(?intent, left, right, "chassis");
        self.bus.set_wheel_speed(&mut self.left, left)?;
        self.bus.set_wheel_speed(&mut self.right, right)
    }

    /// Both wheels at `speed`; backward if negative.
    pub fn forward(
        &mut self,
        speed: f32,
    ) -> Result<(), DeviceError<E>> {
        self.apply(MotionIntent::Forward { speed })
    }

    /// Both wheels at `-speed`.
    pub fn backward(
        &mut self,
        speed: f32,
    ) -> Result<(), DeviceError<E>> {
        self.apply(MotionIntent::Backward { speed })
    }

    /// Turn left with the right wheel at `speed` and the left wheel following
    /// a circle of `radius_cm`. A zero radius stops the left wheel.
    pub fn turn_left(
        &mut self,
        speed: f32,
        radius_cm: f32,
    ) -> Result<(), DeviceError<E>> {
        self.turn(Side::Left, speed, radius_cm)
    }

    /// Mirror of [`turn_left`](Self::turn_left).
    pub fn turn_right(
        &mut self,
        speed: f32,
        radius_cm: f32,
    ) -> Result<(), DeviceError<E>> {
        self.turn(Side::Right, speed, radius_cm)
    }

    pub fn turn(
        &mut self,
        side: Side,
        speed: f32,
        radius_cm: f32,
    ) -> Result<(), DeviceError<E>> {
        self.apply(MotionIntent::ArcTurn {
            side,
            speed,
            radius_cm,
        })
    }

    /// Spin in place, clockwise for positive `speed`.
    pub fn rotate(
        &mut self,
        speed: f32,
    ) -> Result<(), DeviceError<E>> {
        self.apply(MotionIntent::Rotate { speed })
    }

    pub fn stop(&mut self) -> Result<(), DeviceError<E>> {
        self.apply(MotionIntent::Stop)
    }

    /// Release the bus and delay.
    pub fn release(self) -> (I2C, D) {
        self.bus.release()
    }
}
