//! Hardware controllers and the `Robot` facade.
//!
//! - `i2c`: motor controller protocol and connection handling
//! - `chassis`: continuous differential-drive commands
//! - `driver`: blocking distance/angle moves
//! - `ultrasonic`: trigger/echo distance sensor
//! - `pins`: floor sensors and indicator lights
//! - `leds`: bottom RGB LEDs

pub mod chassis;
pub mod driver;
pub mod i2c;
pub mod leds;
pub mod pins;
pub mod ultrasonic;

use core::{cell::RefCell, fmt};

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    i2c::I2c,
};
use embedded_hal_bus::i2c::RefCellDevice;
use serde::{Deserialize, Serialize};
use smart_leds_trait::{SmartLedsWrite, RGB8};

pub use chassis::{Chassis, DEFAULT_SPEED};
pub use driver::Driver;
pub use i2c::{DeviceError, MotorBus, WheelChannel};
pub use leds::LedStrip;
pub use pins::{FloorSensorPair, IndicatorLights};
pub use ultrasonic::{PulseTimer, RangingSample, UltrasonicRanger};

use crate::utils::{
    config::RobotConfig,
    math::kinematics::{MotionIntent, Side},
};

/// Commands accepted by [`Robot::execute`].
///
/// Serialized as JSON with tag `"ct"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "ct", rename_all = "snake_case")] // ct = command type
pub enum RobotCommand {
    /// Continuous chassis motion; returns at once.
    Motion(MotionIntent),
    /// Blocking straight move.
    Drive {
        cm: f32,
        #[serde(default = "default_speed")]
        speed: f32,
    },
    /// Blocking turn.
    Turn {
        direction: Side,
        degrees: f32,
        #[serde(default)]
        radius_cm: f32,
        #[serde(default = "default_speed")]
        speed: f32,
    },
    Lights { left: u8, right: u8 },
    /// Buffer one pixel; takes effect on `Show`.
    Pixel { index: usize, r: u8, g: u8, b: u8 },
    /// Set and show all pixels.
    Fill { r: u8, g: u8, b: u8 },
    Show,
    Clear,
    Range {
        #[serde(default = "default_attempts")]
        attempts: u32,
    },
    Floor,
}

fn default_speed() -> f32 {
    DEFAULT_SPEED
}

fn default_attempts() -> u32 {
    1
}

/// Data produced by a command.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "r", rename_all = "snake_case")]
pub enum Reading {
    /// Distance in cm, `-1` when no echo came back.
    Distance { cm: f32 },
    Floor { left: u8, right: u8 },
    /// A blocking move finished after `ms` milliseconds.
    Moved { ms: u64 },
}

/// Share one I2C bus between the motor controller and other devices.
pub fn shared_bus<I2C>(bus: &RefCell<I2C>) -> RefCellDevice<'_, I2C> {
    RefCellDevice::new(bus)
}

/// Every peripheral of the robot apart from the motor bus.
pub struct Peripherals<Trig, Echo, FloorL, FloorR, LightL, LightR, Leds> {
    pub trigger: Trig,
    pub echo: Echo,
    pub floor_left: FloorL,
    pub floor_right: FloorR,
    pub light_left: LightL,
    pub light_right: LightR,
    pub leds: Leds,
}

/// The whole robot: motion, sensors and lights behind one handle.
pub struct Robot<I2C, D, Trig, Echo, FloorL, FloorR, LightL, LightR, Leds> {
    driver: Driver<I2C, D>,
    ranger: UltrasonicRanger<Trig, Echo, D>,
    floor: FloorSensorPair<FloorL, FloorR>,
    lights: IndicatorLights<LightL, LightR>,
    leds: LedStrip<Leds>,
}

impl<I2C, D, Trig, Echo, FloorL, FloorR, LightL, LightR, Leds, E, LedE>
    Robot<I2C, D, Trig, Echo, FloorL, FloorR, LightL, LightR, Leds>
where
    I2C: I2c<Error = E>,
    E: fmt::Debug,
    D: DelayNs + Clone,
    Trig: OutputPin,
    Echo: PulseTimer,
    FloorL: InputPin,
    FloorR: InputPin,
    LightL: OutputPin,
    LightR: OutputPin,
    Leds: SmartLedsWrite<Color = RGB8, Error = LedE>,
    LedE: fmt::Debug,
{
    /// Assemble the robot. Fails only on an invalid wheelbase; the motor
    /// controller is looked for on the first motion command.
    pub fn new(
        i2c: I2C,
        delay: D,
        peripherals: Peripherals<Trig, Echo, FloorL, FloorR, LightL, LightR, Leds>,
        config: RobotConfig,
    ) -> Result<Self, DeviceError<E>> {
        let chassis = Chassis::new(i2c, delay.clone(), config.wheelbase_cm, config.motor_bus)?;
        let p = peripherals;
        Ok(Robot {
            driver: Driver::new(chassis, delay.clone(), config.calibration),
            ranger: UltrasonicRanger::new(p.trigger, p.echo, delay, config.ranging),
            floor: FloorSensorPair::new(p.floor_left, p.floor_right),
            lights: IndicatorLights::new(p.light_left, p.light_right),
            leds: LedStrip::new(p.leds),
        })
    }

    /// Continuous motion controls.
    pub fn chassis(&mut self) -> &mut Chassis<I2C, D> {
        self.driver.chassis()
    }

    /// Blocking motion controls.
    pub fn driver(&mut self) -> &mut Driver<I2C, D> {
        &mut self.driver
    }

    pub fn leds(&mut self) -> &mut LedStrip<Leds> {
        &mut self.leds
    }

    /// `(left, right)` floor readings, 1 = bright.
    pub fn floor_sensors(&mut self) -> Result<(u8, u8), DeviceError<E>> {
        Ok(self.floor.read_pair()?)
    }

    /// Distance ahead in cm, or the failure sentinel.
    pub fn range(
        &mut self,
        max_attempts: u32,
    ) -> Result<RangingSample, DeviceError<E>> {
        let sample = self.ranger.measure(max_attempts)?;
        if !sample.is_valid() {
            tracing::warn!(max_attempts, "ultrasonic ranging failed");
        }
        Ok(sample)
    }

    pub fn set_lights(
        &mut self,
        left: u8,
        right: u8,
    ) -> Result<(), DeviceError<E>> {
        Ok(self.lights.set_lights(left, right)?)
    }

    /// Run one [`RobotCommand`].
    ///
    /// Returns sensor data for `Range`/`Floor`, the move time for
    /// `Drive`/`Turn`, and `None` otherwise.
    pub fn execute(
        &mut self,
        command: RobotCommand,
    ) -> Result<Option<Reading>, DeviceError<E>> {
        tracing::info!(?command, "executing");
        match command {
            RobotCommand::Motion(intent) => {
                self.chassis().apply(intent)?;
                Ok(None)
            }
            RobotCommand::Drive { cm, speed } => {
                let wait = self.driver.drive(cm, speed)?;
                Ok(Some(Reading::Moved {
                    ms: wait.as_millis(),
                }))
            }
            RobotCommand::Turn {
                direction,
                degrees,
                radius_cm,
                speed,
            } => {
                let wait = self.driver.turn(direction, degrees, radius_cm, speed)?;
                Ok(Some(Reading::Moved {
                    ms: wait.as_millis(),
                }))
            }
            RobotCommand::Lights { left, right } => {
                self.set_lights(left, right)?;
                Ok(None)
            }
            RobotCommand::Pixel { index, r, g, b } => {
                self.leds
                    .set_pixel(index, RGB8 { r, g, b })
                    .map_err(|_| DeviceError::InvalidArgument("led index out of range"))?;
                Ok(None)
            }
            RobotCommand::Fill { r, g, b } => {
                self.leds.fill(RGB8 { r, g, b });
                self.leds.show().map_err(led_error)?;
                Ok(None)
            }
            RobotCommand::Show => {
                self.leds.show().map_err(led_error)?;
                Ok(None)
            }
            RobotCommand::Clear => {
                self.leds.clear().map_err(led_error)?;
                Ok(None)
            }
            RobotCommand::Range { attempts } => {
                let sample = self.range(attempts)?;
                Ok(Some(Reading::Distance { cm: sample.value() }))
            }
            RobotCommand::Floor => {
                let (left, right) = self.floor_sensors()?;
                Ok(Some(Reading::Floor { left, right }))
            }
        }
    }
}

fn led_error<LedE: fmt::Debug, E: fmt::Debug>(e: LedE) -> DeviceError<E> {
    tracing::error!(?e, "LED write failed");
    DeviceError::Led
}
