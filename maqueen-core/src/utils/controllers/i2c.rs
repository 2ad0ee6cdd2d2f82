//! I2C motor controller for the Maqueen chassis.
//!
//! The controller sits at bus address `0x10` and accepts one 3-byte frame per
//! wheel: `[channel, direction, magnitude]`. `MotorBus` owns the connection
//! state and establishes it lazily on the first speed command.

use core::fmt;

use embassy_time::Duration;
use embedded_hal::{delay::DelayNs, digital, i2c::I2c};

use crate::utils::{config::MotorBusConfig, math::kinematics::Side};

/// Bus address of the motor controller.
pub const MOTOR_ADDRESS: u8 = 0x10;
/// Channel byte selecting the left wheel.
pub const LEFT_CHANNEL: u8 = 0x00;
/// Channel byte selecting the right wheel.
pub const RIGHT_CHANNEL: u8 = 0x02;
/// Largest magnitude the controller accepts.
pub const MAX_MAGNITUDE: u8 = 255;

/// Errors that can occur when driving the robot hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError<E: fmt::Debug> {
    /// The motor controller never answered within the connect budget.
    MotorControllerUnavailable,
    /// A parameter was rejected before any I/O took place.
    InvalidArgument(&'static str),
    /// Transport fault reported by the I2C bus.
    Bus(E),
    /// Fault reported by a digital pin or the echo timer.
    Pin(digital::ErrorKind),
    /// The LED driver refused a frame.
    Led,
}

impl<E: fmt::Debug> fmt::Display for DeviceError<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            DeviceError::MotorControllerUnavailable => {
                write!(f, "motor controller not found at 0x{:02X}", MOTOR_ADDRESS)
            }
            DeviceError::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
            DeviceError::Bus(e) => write!(f, "i2c bus error: {:?}", e),
            DeviceError::Pin(kind) => write!(f, "pin error: {:?}", kind),
            DeviceError::Led => f.write_str("led driver error"),
        }
    }
}

impl<E: fmt::Debug> From<digital::ErrorKind> for DeviceError<E> {
    fn from(kind: digital::ErrorKind) -> Self {
        DeviceError::Pin(kind)
    }
}

/// Rotation sense encoded in the second frame byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward = 0,
    Backward = 1,
}

/// Stateful view of one wheel's motor channel.
///
/// The magnitude is always non-negative; the sign of the commanded speed is
/// carried by `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelChannel {
    side: Side,
    direction: Direction,
    magnitude: u8,
}

impl WheelChannel {
    pub const fn left() -> Self {
        Self::new(Side::Left)
    }

    pub const fn right() -> Self {
        Self::new(Side::Right)
    }

    const fn new(side: Side) -> Self {
        Self {
            side,
            direction: Direction::Forward,
            magnitude: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Channel byte for this wheel.
    pub fn subaddress(&self) -> u8 {
        match self.side {
            Side::Left => LEFT_CHANNEL,
            Side::Right => RIGHT_CHANNEL,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn magnitude(&self) -> u8 {
        self.magnitude
    }

    /// Record a signed speed, splitting it into direction and magnitude.
    pub fn set(
        &mut self,
        signed_speed: f32,
    ) {
        self.direction = if signed_speed < 0.0 {
            Direction::Backward
        } else {
            Direction::Forward
        };
        self.magnitude = magnitude(signed_speed);
    }

    /// Wire frame for the last recorded speed.
    pub fn frame(&self) -> [u8; 3] {
        [self.subaddress(), self.direction as u8, self.magnitude]
    }
}

/// `round(clamp(|speed|, 0, 255))`; NaN maps to zero.
pub fn magnitude(signed_speed: f32) -> u8 {
    if signed_speed.is_nan() {
        return 0;
    }
    let m = libm::roundf(libm::fabsf(signed_speed));
    if m >= MAX_MAGNITUDE as f32 {
        MAX_MAGNITUDE
    } else {
        m as u8
    }
}

/// Progress of finding the motor controller on the bus. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connecting { attempts_remaining: u32 },
    Connected,
}

/// Speed/direction commands to the motor controller over I2C.
pub struct MotorBus<I2C, D> {
    i2c: I2C,
    delay: D,
    config: MotorBusConfig,
    state: ConnectionState,
}

impl<I2C, D, E> MotorBus<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
    E: fmt::Debug,
{
    /// Create an unconnected bus handle. No I/O happens until the first
    /// [`connect`](Self::connect) or speed command.
    pub fn new(
        i2c: I2C,
        delay: D,
        config: MotorBusConfig,
    ) -> Self {
        MotorBus {
            i2c,
            delay,
            config,
            state: ConnectionState::Unconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Look for the controller every poll interval until it acknowledges or
    /// the attempt budget derived from the configured timeout runs out.
    ///
    /// Returns immediately once connected.
    pub fn connect(&mut self) -> Result<(), DeviceError<E>> {
        self.connect_within(self.config.connect_timeout())
    }

    /// Like [`connect`](Self::connect) with an explicit time budget,
    /// approximated as `timeout / poll_interval` presence checks (at least one).
    pub fn connect_within(
        &mut self,
        timeout: Duration,
    ) -> Result<(), DeviceError<E>> {
        if self.is_connected() {
            return Ok(());
        }
        // a previously exhausted budget is renewed; the state never goes back
        // to Unconnected
        let mut attempts_remaining = self.config.attempts_within(timeout);
        let poll_ms = self.config.poll_interval().as_millis() as u32;

        while attempts_remaining > 0 {
            attempts_remaining -= 1;
            self.state = ConnectionState::Connecting { attempts_remaining };
            if self.controller_present() {
                self.state = ConnectionState::Connected;
                tracing::info!("Motor connection established");
                return Ok(());
            }
            if attempts_remaining > 0 {
                self.delay.delay_ms(poll_ms);
            }
        }

        tracing::warn!(
            timeout_ms = timeout.as_millis(),
            "motor controller not found at 0x{:02X}",
            MOTOR_ADDRESS
        );
        Err(DeviceError::MotorControllerUnavailable)
    }

    /// Zero-length write; an acknowledge means the controller is present.
    fn controller_present(&mut self) -> bool {
        self.i2c.write(MOTOR_ADDRESS, &[]).is_ok()
    }

    /// Command `wheel` to `signed_speed`, connecting first if needed.
    ///
    /// The speed is clamped to ±255 and rounded; one frame is written.
    pub fn set_wheel_speed(
        &mut self,
        wheel: &mut WheelChannel,
        signed_speed: f32,
    ) -> Result<(), DeviceError<E>> {
        self.connect()?;
        // the channel only records what the controller accepted
        let mut next = *wheel;
        next.set(signed_speed);
        let frame = next.frame();
        tracing::trace!(?frame, speed = signed_speed, "motor frame");
        self.i2c
            .write(MOTOR_ADDRESS, &frame)
            .map_err(DeviceError::Bus)?;
        *wheel = next;
        Ok(())
    }

    /// Release the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_rounds_and_clamps() {
        assert_eq!(magnitude(40.7), 41);
        assert_eq!(magnitude(-120.0), 120);
        assert_eq!(magnitude(19.23), 19);
        assert_eq!(magnitude(0.5), 1);
        assert_eq!(magnitude(300.0), 255);
        assert_eq!(magnitude(-1e9), 255);
        assert_eq!(magnitude(f32::NAN), 0);
    }

    #[test]
    fn wheel_frame_carries_sign_as_direction() {
        let mut right = WheelChannel::right();
        right.set(-120.0);
        assert_eq!(right.frame(), [RIGHT_CHANNEL, 1, 120]);

        let mut left = WheelChannel::left();
        left.set(40.7);
        assert_eq!(left.frame(), [LEFT_CHANNEL, 0, 41]);
        assert_eq!(left.direction(), Direction::Forward);
    }
}
