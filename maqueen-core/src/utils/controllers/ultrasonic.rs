//! Ultrasonic ranging (HC-SR04 style trigger/echo sensor).
//!
//! One ranging cycle raises the trigger line for a short pulse, then times the
//! high pulse on the echo line. A missing or overlong echo is normal when
//! nothing is in range, so failure is reported as a sentinel sample rather
//! than an error.

use embedded_hal::{
    delay::DelayNs,
    digital::{self, Error as _, OutputPin, PinState},
};

use crate::utils::config::RangingConfig;

/// Measures the width of a pulse on an input line.
///
/// Platform HALs implement this over their capture timer or a busy loop.
pub trait PulseTimer {
    type Error: digital::Error;

    /// Wait for a pulse at `level` and return its width in microseconds, or
    /// `None` if no complete pulse was seen within `timeout_us`.
    fn pulse_width_us(
        &mut self,
        level: PinState,
        timeout_us: u32,
    ) -> Result<Option<u32>, Self::Error>;
}

/// One distance reading in centimeters, or [`RangingSample::FAILED`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangingSample(f32);

impl RangingSample {
    /// Sentinel for "no reliable echo".
    pub const FAILED: RangingSample = RangingSample(-1.0);

    pub fn from_cm(cm: f32) -> Self {
        RangingSample(cm)
    }

    pub fn is_valid(&self) -> bool {
        self.0 >= 0.0
    }

    /// Distance, if the measurement succeeded.
    pub fn centimeters(&self) -> Option<f32> {
        self.is_valid().then_some(self.0)
    }

    /// Raw value with `-1.0` for failure.
    pub fn value(&self) -> f32 {
        self.0
    }
}

pub struct UltrasonicRanger<Trig, Echo, D> {
    trigger: Trig,
    echo: Echo,
    delay: D,
    config: RangingConfig,
}

impl<Trig, Echo, D> UltrasonicRanger<Trig, Echo, D>
where
    Trig: OutputPin,
    Echo: PulseTimer,
    D: DelayNs,
{
    pub fn new(
        trigger: Trig,
        echo: Echo,
        delay: D,
        config: RangingConfig,
    ) -> Self {
        Self {
            trigger,
            echo,
            delay,
            config,
        }
    }

    pub fn config(&self) -> &RangingConfig {
        &self.config
    }

    /// Run up to `max_attempts` ranging cycles (at least one) and return the
    /// first valid distance, or [`RangingSample::FAILED`] once all cycles
    /// timed out. Cycles are separated by the configured retry delay.
    ///
    /// Pin faults are returned as errors.
    pub fn measure(
        &mut self,
        max_attempts: u32,
    ) -> Result<RangingSample, digital::ErrorKind> {
        let mut attempts = max_attempts.max(1);
        loop {
            attempts -= 1;
            if let Some(width) = self.cycle()? {
                let cm = width as f32 * self.config.cm_per_us;
                tracing::trace!(width_us = width, cm, "echo");
                return Ok(RangingSample::from_cm(cm));
            }
            if attempts == 0 {
                tracing::debug!(max_attempts, "no echo");
                return Ok(RangingSample::FAILED);
            }
            self.delay.delay_ms(self.config.retry_delay_ms);
        }
    }

    /// Trigger once and return the echo width if it is below the timeout.
    fn cycle(&mut self) -> Result<Option<u32>, digital::ErrorKind> {
        self.trigger.set_high().map_err(|e| e.kind())?;
        self.delay.delay_us(self.config.trigger_pulse_us);
        self.trigger.set_low().map_err(|e| e.kind())?;

        let width = self
            .echo
            .pulse_width_us(PinState::High, self.config.timeout_us)
            .map_err(|e| e.kind())?;
        Ok(width.filter(|&w| w < self.config.timeout_us))
    }

    pub fn release(self) -> (Trig, Echo, D) {
        (self.trigger, self.echo, self.delay)
    }
}
