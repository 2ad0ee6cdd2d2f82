//! Floor sensors and front indicator lights.
//!
//! Thin wrappers over two digital pins each; every call touches the hardware.

use embedded_hal::digital::{Error as _, ErrorKind, InputPin, OutputPin, PinState};

/// Left/right floor brightness sensors: 1 = bright surface, 0 = dark.
pub struct FloorSensorPair<L, R> {
    left: L,
    right: R,
}

impl<L: InputPin, R: InputPin> FloorSensorPair<L, R> {
    pub fn new(
        left: L,
        right: R,
    ) -> Self {
        Self { left, right }
    }

    pub fn read_left(&mut self) -> Result<u8, ErrorKind> {
        self.left.is_high().map(u8::from).map_err(|e| e.kind())
    }

    pub fn read_right(&mut self) -> Result<u8, ErrorKind> {
        self.right.is_high().map(u8::from).map_err(|e| e.kind())
    }

    /// Both readings, left first.
    pub fn read_pair(&mut self) -> Result<(u8, u8), ErrorKind> {
        Ok((self.read_left()?, self.read_right()?))
    }
}

/// The two front LEDs.
pub struct IndicatorLights<L, R> {
    left: L,
    right: R,
}

impl<L: OutputPin, R: OutputPin> IndicatorLights<L, R> {
    pub fn new(
        left: L,
        right: R,
    ) -> Self {
        Self { left, right }
    }

    /// Switch the lights; any non-zero value is on.
    pub fn set_lights(
        &mut self,
        left: u8,
        right: u8,
    ) -> Result<(), ErrorKind> {
        self.left
            .set_state(PinState::from(left != 0))
            .map_err(|e| e.kind())?;
        self.right
            .set_state(PinState::from(right != 0))
            .map_err(|e| e.kind())
    }
}
