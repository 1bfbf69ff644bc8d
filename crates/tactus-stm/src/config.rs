//! STM sampling resolution.
//!
//! An STM pattern's playback rate can be requested as an explicit
//! [`SamplingConfig`], as a pattern repetition frequency, or as a pattern
//! period. Frequencies and periods are resolved against the pattern
//! length `n` when the STM is produced: exact variants fail on
//! non-integral divisions, `*_nearest` variants round and never fail.

use std::time::Duration;

use tactus_core::error::{Error, Result};
use tactus_core::sampling::SamplingConfig;

/// A requested STM playback rate, resolved against the pattern length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StmConfig {
    /// An explicit per-sample configuration.
    Sampling(SamplingConfig),
    /// Pattern repetition frequency in hertz (exact).
    Freq(f32),
    /// Pattern period (exact).
    Period(Duration),
    /// Pattern repetition frequency in hertz, rounded to the nearest
    /// achievable rate.
    FreqNearest(f32),
    /// Pattern period, rounded to the nearest achievable rate.
    PeriodNearest(Duration),
}

impl StmConfig {
    /// Resolve to a concrete sampling configuration for a pattern of `n`
    /// samples.
    pub fn resolve(&self, n: usize) -> Result<SamplingConfig> {
        debug_assert!(n > 0);
        match *self {
            StmConfig::Sampling(config) => Ok(config),
            StmConfig::Freq(freq_hz) => SamplingConfig::from_freq(freq_hz * n as f32),
            StmConfig::FreqNearest(freq_hz) => {
                Ok(SamplingConfig::from_freq_nearest(freq_hz * n as f32))
            }
            StmConfig::Period(period) => {
                let nanos = period.as_nanos();
                if nanos == 0 || nanos % n as u128 != 0 {
                    return Err(Error::Driver(format!(
                        "STM period {period:?} does not divide evenly into {n} samples"
                    )));
                }
                SamplingConfig::from_period(Duration::from_nanos((nanos / n as u128) as u64))
            }
            StmConfig::PeriodNearest(period) => {
                let nanos = period.as_nanos();
                let per_sample = (nanos + n as u128 / 2) / n as u128;
                Ok(SamplingConfig::from_period_nearest(Duration::from_nanos(
                    per_sample.min(u128::from(u64::MAX)) as u64,
                )))
            }
        }
    }

    /// Convert to the rounding variant.
    ///
    /// Only defined for frequency- and period-specified configurations;
    /// an explicit sampling configuration has no nearest counterpart.
    pub fn into_nearest(self) -> Result<StmConfig> {
        match self {
            StmConfig::Sampling(_) => Err(Error::InvalidParameter(
                "an explicit sampling configuration has no nearest variant".into(),
            )),
            StmConfig::Freq(f) => Ok(StmConfig::FreqNearest(f)),
            StmConfig::Period(p) => Ok(StmConfig::PeriodNearest(p)),
            nearest @ (StmConfig::FreqNearest(_) | StmConfig::PeriodNearest(_)) => Ok(nearest),
        }
    }
}

impl From<SamplingConfig> for StmConfig {
    fn from(config: SamplingConfig) -> Self {
        StmConfig::Sampling(config)
    }
}

impl From<f32> for StmConfig {
    fn from(freq_hz: f32) -> Self {
        StmConfig::Freq(freq_hz)
    }
}

impl From<Duration> for StmConfig {
    fn from(period: Duration) -> Self {
        StmConfig::Period(period)
    }
}
