//! Square-wave amplitude modulation.

use tactus_core::error::{Error, Result};
use tactus_core::sampling::SamplingConfig;

use crate::{Modulation, resolve_periodic};

/// A square-wave amplitude envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Square {
    freq_hz: f32,
    nearest: bool,
    high: u8,
    low: u8,
    duty: f32,
    config: SamplingConfig,
}

impl Square {
    /// Create a square modulation at `freq_hz`, sampled at 4 kHz,
    /// switching between 0 and full amplitude with a 50% duty cycle.
    pub const fn new(freq_hz: f32) -> Self {
        Square {
            freq_hz,
            nearest: false,
            high: 0xFF,
            low: 0x00,
            duty: 0.5,
            config: SamplingConfig::FREQ_4K,
        }
    }

    /// Set the high amplitude.
    pub const fn with_high(mut self, high: u8) -> Self {
        self.high = high;
        self
    }

    /// Set the low amplitude.
    pub const fn with_low(mut self, low: u8) -> Self {
        self.low = low;
        self
    }

    /// Set the duty cycle (fraction of each period spent high).
    pub const fn with_duty(mut self, duty: f32) -> Self {
        self.duty = duty;
        self
    }

    /// Set the sampling configuration.
    pub const fn with_sampling_config(mut self, config: SamplingConfig) -> Self {
        self.config = config;
        self
    }

    /// Round to the nearest achievable frequency instead of requiring an
    /// exact one.
    pub const fn into_nearest(mut self) -> Self {
        self.nearest = true;
        self
    }
}

impl Modulation for Square {
    fn sampling_config(&self) -> SamplingConfig {
        self.config
    }

    fn calc(&self) -> Result<Vec<u8>> {
        if !(0.0..=1.0).contains(&self.duty) {
            return Err(Error::InvalidParameter(format!(
                "duty cycle must be within [0, 1], got {}",
                self.duty
            )));
        }
        let (n, cycles) = resolve_periodic(self.freq_hz, self.config, self.nearest)?;
        Ok((0..n)
            .map(|i| {
                // Position within the current waveform cycle, in [0, 1).
                let frac = (i as u64 * cycles % n as u64) as f32 / n as f32;
                if frac < self.duty { self.high } else { self.low }
            })
            .collect())
    }
}

impl_modulation_datagram!(Square);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_percent_duty() {
        // 200 Hz at 4 kHz: 20 samples, 10 high then 10 low.
        let buf = Square::new(200.0).calc().unwrap();
        assert_eq!(buf.len(), 20);
        assert!(buf[..10].iter().all(|&v| v == 0xFF));
        assert!(buf[10..].iter().all(|&v| v == 0x00));
    }

    #[test]
    fn duty_out_of_range_rejected() {
        assert!(matches!(
            Square::new(200.0).with_duty(1.5).calc(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn custom_levels() {
        let buf = Square::new(200.0)
            .with_high(0xC0)
            .with_low(0x40)
            .calc()
            .unwrap();
        assert_eq!(buf[0], 0xC0);
        assert_eq!(buf[19], 0x40);
    }
}
