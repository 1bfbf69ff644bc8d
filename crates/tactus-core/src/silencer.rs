//! The transition-smoothing filter configuration.
//!
//! The silencer limits how fast per-transducer phase and intensity may
//! change, smoothing segment transitions and modulation steps. Its
//! completion-time variant interacts with sampling configurations: in
//! strict mode the firmware rejects content whose sampling period is
//! shorter than the configured settling time.

use std::time::Duration;

use crate::command::{Command, Op, SilencerOp};
use crate::datagram::Datagram;
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::sampling::{BASE_PERIOD_NS, SamplingConfig};

/// Number of 25 µs ticks needed to settle within `time`.
pub(crate) fn completion_steps(time: Duration) -> u128 {
    time.as_nanos().div_ceil(u128::from(BASE_PERIOD_NS))
}

/// A target whose sampling configurations the silencer can be validated
/// against (modulations and STM patterns).
pub trait HasSamplingConfig {
    /// Sampling configuration driving intensity updates.
    fn sampling_config_intensity(&self) -> Result<SamplingConfig>;

    /// Sampling configuration driving phase updates.
    fn sampling_config_phase(&self) -> Result<SamplingConfig>;
}

/// Silencer configured with fixed per-tick update step sizes.
///
/// Larger steps settle faster but smooth less. Steps must be non-zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedUpdateRate {
    intensity: u16,
    phase: u16,
}

impl FixedUpdateRate {
    /// Create an update-rate configuration.
    ///
    /// Returns [`Error::CantBeZero`] when either step is 0.
    pub fn new(intensity: u16, phase: u16) -> Result<Self> {
        if intensity == 0 || phase == 0 {
            return Err(Error::CantBeZero(0));
        }
        Ok(FixedUpdateRate { intensity, phase })
    }
}

/// Silencer configured with fixed settling times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedCompletionTime {
    /// Settling time for intensity changes.
    pub intensity: Duration,
    /// Settling time for phase changes.
    pub phase: Duration,
}

impl FixedCompletionTime {
    /// Create a completion-time configuration.
    pub const fn new(intensity: Duration, phase: Duration) -> Self {
        FixedCompletionTime { intensity, phase }
    }
}

impl Default for FixedCompletionTime {
    fn default() -> Self {
        FixedCompletionTime {
            intensity: Duration::from_micros(250),
            phase: Duration::from_micros(1000),
        }
    }
}

/// The silencer datagram.
///
/// The default configuration settles intensity within 250 µs and phase
/// within 1 ms, in strict mode. [`Silencer::disable`] configures the
/// fastest possible settling (one tick), effectively disabling smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Silencer<C = FixedCompletionTime> {
    config: C,
    strict: bool,
}

impl Silencer<FixedCompletionTime> {
    /// The default silencer (250 µs intensity, 1 ms phase, strict).
    pub fn new() -> Self {
        Silencer {
            config: FixedCompletionTime::default(),
            strict: true,
        }
    }

    /// A silencer that effectively disables smoothing: both settling
    /// times are one 25 µs tick.
    pub fn disable() -> Self {
        Silencer {
            config: FixedCompletionTime::new(
                Duration::from_micros(25),
                Duration::from_micros(25),
            ),
            strict: true,
        }
    }

    /// Enable or disable strict-mode validation.
    ///
    /// Strict mode is only meaningful for completion-time silencers, so
    /// this method is only available on them.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether the given modulation/STM target respects this silencer's
    /// settling times: each sampling period must be at least the
    /// corresponding settling time.
    pub fn is_valid(&self, target: &impl HasSamplingConfig) -> Result<bool> {
        let intensity_ok = completion_steps(self.config.intensity)
            <= u128::from(target.sampling_config_intensity()?.division());
        let phase_ok = completion_steps(self.config.phase)
            <= u128::from(target.sampling_config_phase()?.division());
        Ok(intensity_ok && phase_ok)
    }
}

impl Default for Silencer<FixedCompletionTime> {
    fn default() -> Self {
        Silencer::new()
    }
}

impl Silencer<FixedUpdateRate> {
    /// Create a silencer with fixed per-tick update steps.
    ///
    /// Update-rate silencers never reject content, so there is no strict
    /// mode to configure.
    pub fn from_update_rate(config: FixedUpdateRate) -> Self {
        Silencer {
            config,
            strict: false,
        }
    }
}

impl Datagram for Silencer<FixedCompletionTime> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        Ok(Command::broadcast(
            geometry,
            Op::ConfigSilencer(SilencerOp::CompletionTime {
                intensity: self.config.intensity,
                phase: self.config.phase,
                strict: self.strict,
            }),
        ))
    }
}

impl Datagram for Silencer<FixedUpdateRate> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        Ok(Command::broadcast(
            geometry,
            Op::ConfigSilencer(SilencerOp::UpdateRate {
                intensity: self.config.intensity,
                phase: self.config.phase,
            }),
        ))
    }
}
