use clap::Parser;
use embedded_hal::{
    delay::DelayNs,
    digital::{self, InputPin, OutputPin, PinState},
    i2c::{self, I2c, Operation},
};
use maqueen_core::utils::{
    RobotCommand, RobotConfig,
    controllers::{DeviceError, Peripherals, PulseTimer, Robot, i2c::MOTOR_ADDRESS},
};
use smart_leds_trait::{RGB8, SmartLedsWrite};
use std::{
    convert::Infallible,
    fs,
    io::{self, BufRead},
    path::PathBuf,
    thread,
    time::Duration,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// Newline-delimited JSON commands; reads stdin when omitted
    #[clap(long)]
    script: Option<PathBuf>,
    /// JSON robot configuration file
    #[clap(long)]
    config: Option<PathBuf>,
    /// override the wheelbase (cm)
    #[clap(long)]
    wheelbase: Option<f32>,
    /// override the distance calibration constant
    #[clap(long)]
    k_distance: Option<f32>,
    /// override the turn calibration constant
    #[clap(long)]
    k_angle: Option<f32>,
    /// distance of the simulated obstacle (cm); no echo when omitted
    #[clap(long)]
    obstacle_cm: Option<f32>,
    /// floor sensor levels as seen by the simulated robot
    #[clap(long, num_args = 2, default_values_t = [0, 0])]
    floor: Vec<u8>,
    /// simulate a robot whose motor controller never answers
    #[clap(long)]
    no_controller: bool,
    /// skip real sleeps
    #[clap(long)]
    fast: bool,
}

/// I2C bus that logs every write and acknowledges the motor controller.
struct SimBus {
    controller_present: bool,
}

impl i2c::ErrorType for SimBus {
    type Error = i2c::ErrorKind;
}

impl I2c for SimBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != MOTOR_ADDRESS || !self.controller_present {
            return Err(i2c::ErrorKind::NoAcknowledge(
                i2c::NoAcknowledgeSource::Address,
            ));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) if bytes.is_empty() => {
                    info!("I2C presence check 0x{:02X}", address)
                }
                Operation::Write(bytes) => info!("I2C 0x{:02X} <- {:02X?}", address, bytes),
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

/// Digital pin that logs writes and returns a fixed level.
struct SimPin {
    name: &'static str,
    level: bool,
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level = false;
        tracing::debug!(pin = self.name, "low");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level = true;
        tracing::debug!(pin = self.name, "high");
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level)
    }
}

/// Echo line answering as if an obstacle stood at a fixed distance.
struct SimEcho {
    obstacle_cm: Option<f32>,
    cm_per_us: f32,
}

impl PulseTimer for SimEcho {
    type Error = Infallible;

    fn pulse_width_us(
        &mut self,
        _level: PinState,
        timeout_us: u32,
    ) -> Result<Option<u32>, Self::Error> {
        let width = self
            .obstacle_cm
            .map(|cm| (cm / self.cm_per_us) as u32)
            .filter(|&w| w <= timeout_us);
        Ok(width)
    }
}

/// LED driver that logs to console.
struct SerialLedDriver;

impl SmartLedsWrite for SerialLedDriver {
    type Color = RGB8;
    type Error = Infallible;

    fn write<T, I>(
        &mut self,
        iterator: T,
    ) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        for (i, c) in iterator.into_iter().enumerate() {
            let c: RGB8 = c.into();
            info!("LED {}: {:?}", i, c);
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
struct HostDelay {
    fast: bool,
}

impl DelayNs for HostDelay {
    fn delay_ns(
        &mut self,
        ns: u32,
    ) {
        if !self.fast {
            thread::sleep(Duration::from_nanos(ns as u64));
        }
    }
}

fn load_config(opts: &Opts) -> Result<RobotConfig, Box<dyn std::error::Error>> {
    let mut config = match &opts.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => RobotConfig::default(),
    };
    if let Some(wheelbase) = opts.wheelbase {
        config.wheelbase_cm = wheelbase;
    }
    if let Some(k) = opts.k_distance {
        config.calibration.k_distance = k;
    }
    if let Some(k) = opts.k_angle {
        config.calibration.k_angle = k;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let opts: Opts = Opts::parse();
    let config = load_config(&opts)?;
    info!(?config, "starting mock robot");

    let peripherals = Peripherals {
        trigger: SimPin {
            name: "trigger",
            level: false,
        },
        echo: SimEcho {
            obstacle_cm: opts.obstacle_cm,
            cm_per_us: config.ranging.cm_per_us,
        },
        floor_left: SimPin {
            name: "floor_left",
            level: opts.floor[0] != 0,
        },
        floor_right: SimPin {
            name: "floor_right",
            level: opts.floor[1] != 0,
        },
        light_left: SimPin {
            name: "light_left",
            level: false,
        },
        light_right: SimPin {
            name: "light_right",
            level: false,
        },
        leds: SerialLedDriver,
    };
    let bus = SimBus {
        controller_present: !opts.no_controller,
    };
    let mut robot = Robot::new(bus, HostDelay { fast: opts.fast }, peripherals, config)
        .map_err(|e| e.to_string())?;

    let input: Box<dyn BufRead> = match &opts.script {
        Some(path) => Box::new(io::BufReader::new(fs::File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = match serde_json::from_str::<RobotCommand>(line) {
            Ok(command) => command,
            Err(error) => {
                error!(?error, line, "error deserializing RobotCommand");
                continue;
            }
        };
        match robot.execute(command) {
            Ok(Some(reading)) => println!("{}", serde_json::to_string(&reading)?),
            Ok(None) => {}
            Err(DeviceError::MotorControllerUnavailable) => {
                warn!("motor controller unavailable, command dropped")
            }
            Err(e) => error!("command failed: {}", e),
        }
    }
    Ok(())
}
