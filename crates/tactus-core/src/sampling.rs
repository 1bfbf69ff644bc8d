//! Device sampling configuration.
//!
//! The firmware samples modulation buffers and STM patterns at an integer
//! division of the 40 kHz ultrasound base clock. [`SamplingConfig`] resolves
//! a requested frequency or period to such a division once, at construction:
//! exact constructors fail on a non-integral division, `*_nearest`
//! constructors round and never fail.

use std::num::NonZeroU16;
use std::time::Duration;

use crate::error::{Error, Result};

/// The ultrasound carrier and base sampling frequency in hertz.
pub const BASE_FREQ_HZ: u32 = 40_000;

/// Duration of a single base clock cycle: 25 µs.
pub const BASE_PERIOD_NS: u64 = 25_000;

/// A concrete sampling configuration: an integer division of the 40 kHz
/// base clock.
///
/// Division 1 samples at 40 kHz, division 10 at 4 kHz, and so on. The
/// division is resolved eagerly by the constructors and never re-inspected
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplingConfig {
    division: NonZeroU16,
}

impl SamplingConfig {
    /// 40 kHz sampling (division 1).
    pub const FREQ_40K: SamplingConfig = SamplingConfig {
        division: NonZeroU16::MIN,
    };

    /// 4 kHz sampling (division 10). The default for modulation.
    pub const FREQ_4K: SamplingConfig = SamplingConfig {
        division: match NonZeroU16::new(10) {
            Some(d) => d,
            None => panic!("10 is non-zero"),
        },
    };

    /// The slowest possible sampling (division 65535, ~0.61 Hz).
    ///
    /// Used as the phase sampling config of modulations, which never
    /// change phase.
    pub const FREQ_MIN: SamplingConfig = SamplingConfig {
        division: match NonZeroU16::new(u16::MAX) {
            Some(d) => d,
            None => panic!("65535 is non-zero"),
        },
    };

    /// Create a configuration from an explicit base clock division.
    ///
    /// Returns [`Error::CantBeZero`] when `division` is 0.
    pub fn new(division: u16) -> Result<Self> {
        NonZeroU16::new(division)
            .map(|division| SamplingConfig { division })
            .ok_or(Error::CantBeZero(0))
    }

    /// Create a configuration sampling at exactly `freq_hz`.
    ///
    /// Fails when the frequency does not evenly divide the 40 kHz base
    /// clock; it is never rounded. Use [`from_freq_nearest`]
    /// (SamplingConfig::from_freq_nearest) to round instead.
    pub fn from_freq(freq_hz: f32) -> Result<Self> {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return Err(Error::Driver(format!(
                "sampling frequency must be positive: {freq_hz} Hz"
            )));
        }
        let division = BASE_FREQ_HZ as f32 / freq_hz;
        let rounded = division.round();
        if (division - rounded).abs() > 1e-3 {
            return Err(Error::Driver(format!(
                "sampling frequency {freq_hz} Hz does not evenly divide the {BASE_FREQ_HZ} Hz base clock"
            )));
        }
        if rounded < 1.0 || rounded > f32::from(u16::MAX) {
            return Err(Error::Driver(format!(
                "sampling frequency {freq_hz} Hz is out of the achievable range"
            )));
        }
        Self::new(rounded as u16)
    }

    /// Create a configuration sampling at the nearest achievable frequency
    /// to `freq_hz`. Never fails; the division is rounded and clamped.
    pub fn from_freq_nearest(freq_hz: f32) -> Self {
        let division = if freq_hz.is_finite() && freq_hz > 0.0 {
            (BASE_FREQ_HZ as f32 / freq_hz).round()
        } else {
            f32::from(u16::MAX)
        };
        let division = division.clamp(1.0, f32::from(u16::MAX)) as u16;
        SamplingConfig {
            division: NonZeroU16::new(division).unwrap_or(NonZeroU16::MIN),
        }
    }

    /// Create a configuration with exactly the given sampling period.
    ///
    /// Fails when the period is not a positive multiple of 25 µs.
    pub fn from_period(period: Duration) -> Result<Self> {
        let nanos = period.as_nanos();
        if nanos == 0 || nanos % u128::from(BASE_PERIOD_NS) != 0 {
            return Err(Error::Driver(format!(
                "sampling period {period:?} is not a positive multiple of 25 µs"
            )));
        }
        let division = nanos / u128::from(BASE_PERIOD_NS);
        if division > u128::from(u16::MAX) {
            return Err(Error::Driver(format!(
                "sampling period {period:?} is out of the achievable range"
            )));
        }
        Self::new(division as u16)
    }

    /// Create a configuration with the nearest achievable sampling period
    /// to `period`. Never fails; the division is rounded and clamped.
    pub fn from_period_nearest(period: Duration) -> Self {
        let nanos = period.as_nanos();
        let division = nanos
            .saturating_add(u128::from(BASE_PERIOD_NS) / 2)
            .checked_div(u128::from(BASE_PERIOD_NS))
            .unwrap_or(1)
            .clamp(1, u128::from(u16::MAX)) as u16;
        SamplingConfig {
            division: NonZeroU16::new(division).unwrap_or(NonZeroU16::MIN),
        }
    }

    /// Return the base clock division.
    pub const fn division(self) -> u16 {
        self.division.get()
    }

    /// Return the sampling frequency in hertz.
    pub fn freq(self) -> f32 {
        BASE_FREQ_HZ as f32 / f32::from(self.division.get())
    }

    /// Return the sampling period.
    pub const fn period(self) -> Duration {
        Duration::from_nanos(self.division.get() as u64 * BASE_PERIOD_NS)
    }
}
