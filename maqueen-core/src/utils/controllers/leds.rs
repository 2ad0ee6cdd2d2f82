//! Bottom RGB LEDs of the Maqueen.
//!
//! Wraps an addressable LED driver (`SmartLedsWrite`) with a small frame
//! buffer. Pixel changes are only visible after [`LedStrip::show`].

use smart_leds_trait::{SmartLedsWrite, RGB8};

/// Number of LEDs under the chassis.
pub const LED_COUNT: usize = 4;

const OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// Pixel index past the end of the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub index: usize,
}

/// Buffered LED strip over an addressable LED driver.
pub struct LedStrip<Driver> {
    driver: Driver,
    pixels: [RGB8; LED_COUNT],
}

impl<Driver, E> LedStrip<Driver>
where
    Driver: SmartLedsWrite<Color = RGB8, Error = E>,
{
    /// Create a strip with every pixel off. Nothing is written yet.
    pub fn new(driver: Driver) -> Self {
        Self {
            driver,
            pixels: [OFF; LED_COUNT],
        }
    }

    pub fn pixels(&self) -> &[RGB8; LED_COUNT] {
        &self.pixels
    }

    pub fn set_pixel(
        &mut self,
        index: usize,
        color: RGB8,
    ) -> Result<(), OutOfRange> {
        let px = self.pixels.get_mut(index).ok_or(OutOfRange { index })?;
        *px = color;
        Ok(())
    }

    /// Set every pixel in the buffer to `color`.
    pub fn fill(
        &mut self,
        color: RGB8,
    ) {
        self.pixels = [color; LED_COUNT];
    }

    /// Push the buffer to the LEDs.
    pub fn show(&mut self) -> Result<(), E> {
        self.driver.write(self.pixels.iter().copied())
    }

    /// Turn all LEDs off immediately.
    pub fn clear(&mut self) -> Result<(), E> {
        self.fill(OFF);
        self.show()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::convert::Infallible;
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Vec<RGB8>>,
    }

    impl SmartLedsWrite for Recorder {
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
            self.frames.push(iterator.into_iter().map(Into::into).collect());
            Ok(())
        }
    }

    const RED: RGB8 = RGB8 { r: 255, g: 0, b: 0 };

    #[test]
    fn nothing_written_until_show() {
        let mut strip = LedStrip::new(Recorder::default());
        strip.fill(RED);
        strip.set_pixel(3, RGB8 { r: 255, g: 0, b: 255 }).unwrap();
        assert!(strip.driver.frames.is_empty());

        strip.show().unwrap();
        assert_eq!(strip.driver.frames.len(), 1);
        assert_eq!(strip.driver.frames[0][0], RED);
        assert_eq!(strip.driver.frames[0][3], RGB8 { r: 255, g: 0, b: 255 });
    }

    #[test]
    fn clear_writes_black() {
        let mut strip = LedStrip::new(Recorder::default());
        strip.fill(RED);
        strip.clear().unwrap();
        assert_eq!(strip.driver.frames, [[OFF; LED_COUNT].to_vec()]);
    }

    #[test]
    fn set_pixel_rejects_out_of_range() {
        let mut strip = LedStrip::new(Recorder::default());
        assert_eq!(strip.set_pixel(LED_COUNT, RED), Err(OutOfRange { index: 4 }));
    }
}
