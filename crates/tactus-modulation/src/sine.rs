//! Sinusoidal amplitude modulation.

use tactus_core::error::{Error, Result};
use tactus_core::sampling::SamplingConfig;
use tactus_core::types::Intensity;

use crate::{Modulation, resolve_periodic};

/// A sine-wave amplitude envelope.
///
/// The buffer spans as many waveform cycles as needed to repeat seamlessly
/// at the sampling rate. Exact mode requires an integer frequency that the
/// sampling rate can represent; [`into_nearest`](Sine::into_nearest)
/// rounds to the closest achievable frequency instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sine {
    freq_hz: f32,
    nearest: bool,
    intensity: Intensity,
    offset: u8,
    phase_rad: f32,
    clamp: bool,
    config: SamplingConfig,
}

impl Sine {
    /// Create a sine modulation at `freq_hz`, sampled at 4 kHz, with full
    /// peak-to-peak intensity around a midpoint offset.
    pub const fn new(freq_hz: f32) -> Self {
        Sine {
            freq_hz,
            nearest: false,
            intensity: Intensity::MAX,
            offset: 0x80,
            phase_rad: 0.0,
            clamp: false,
            config: SamplingConfig::FREQ_4K,
        }
    }

    /// Set the peak-to-peak intensity.
    pub const fn with_intensity(mut self, intensity: Intensity) -> Self {
        self.intensity = intensity;
        self
    }

    /// Set the midpoint offset.
    pub const fn with_offset(mut self, offset: u8) -> Self {
        self.offset = offset;
        self
    }

    /// Set the initial phase in radians.
    pub const fn with_phase(mut self, phase_rad: f32) -> Self {
        self.phase_rad = phase_rad;
        self
    }

    /// Clamp out-of-range samples instead of failing.
    pub const fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
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

    /// The requested frequency in hertz.
    pub const fn freq(&self) -> f32 {
        self.freq_hz
    }
}

impl Modulation for Sine {
    fn sampling_config(&self) -> SamplingConfig {
        self.config
    }

    fn calc(&self) -> Result<Vec<u8>> {
        let (n, cycles) = resolve_periodic(self.freq_hz, self.config, self.nearest)?;
        let amp = f32::from(self.intensity.value()) / 2.0;
        let offset = f32::from(self.offset);
        (0..n)
            .map(|i| {
                let theta = 2.0 * std::f32::consts::PI * cycles as f32 * i as f32 / n as f32
                    + self.phase_rad;
                let v = offset + amp * theta.sin();
                if self.clamp {
                    Ok(v.clamp(0.0, 255.0).round() as u8)
                } else if !(-0.5..=255.5).contains(&v) {
                    Err(Error::Driver(format!(
                        "sine sample {v:.1} is out of range; enable clamp or adjust intensity/offset"
                    )))
                } else {
                    Ok(v.round().clamp(0.0, 255.0) as u8)
                }
            })
            .collect()
    }
}

impl_modulation_datagram!(Sine);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_spans_whole_cycles() {
        // 150 Hz at 4 kHz: gcd(150, 4000) = 50, so 80 samples / 3 cycles.
        let buf = Sine::new(150.0).calc().unwrap();
        assert_eq!(buf.len(), 80);
        // 200 Hz divides evenly: one cycle in 20 samples.
        assert_eq!(Sine::new(200.0).calc().unwrap().len(), 20);
    }

    #[test]
    fn starts_at_offset_and_peaks() {
        let buf = Sine::new(200.0).calc().unwrap();
        assert_eq!(buf[0], 0x80);
        assert_eq!(*buf.iter().max().unwrap(), 0xFF);
        assert_eq!(*buf.iter().min().unwrap(), 1);
    }

    #[test]
    fn non_integral_frequency_fails_without_nearest() {
        assert!(Sine::new(100.5).calc().is_err());
        let buf = Sine::new(100.5).into_nearest().calc().unwrap();
        // 4000 / 100.5 = 39.8 -> 40 samples.
        assert_eq!(buf.len(), 40);
    }

    #[test]
    fn nyquist_violation_fails() {
        assert!(Sine::new(3_000.0).calc().is_err());
    }

    #[test]
    fn out_of_range_needs_clamp() {
        let skewed = Sine::new(200.0).with_offset(0x00);
        assert!(skewed.calc().is_err());
        let clamped = skewed.with_clamp(true).calc().unwrap();
        assert_eq!(*clamped.iter().min().unwrap(), 0);
    }

    #[test]
    fn zero_frequency_fails() {
        assert!(Sine::new(0.0).calc().is_err());
    }
}
