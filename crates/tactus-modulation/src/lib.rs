//! tactus-modulation: amplitude envelopes applied on top of a gain.
//!
//! A [`Modulation`] generates a buffer of 8-bit amplitude samples played
//! back at its [`SamplingConfig`]'s rate. Every modulation is a
//! [`Datagram`](tactus_core::Datagram), can target a segment, and can
//! carry a loop behavior. Decorators compose:
//!
//! - [`Cache`] computes the sample buffer at most once per instance.
//! - [`Transform`] post-processes each sample.
//! - [`RadiationPressure`] remaps amplitudes to their radiation-pressure
//!   equivalent.
//! - [`Fir`] convolves the buffer with caller-provided coefficients.

use tactus_core::command::{Command, Op};
use tactus_core::error::{Error, Result};
use tactus_core::geometry::Geometry;
use tactus_core::sampling::SamplingConfig;
use tactus_core::types::{LoopBehavior, Segment, TransitionMode};

/// Implements the datagram traits and
/// [`HasSamplingConfig`](tactus_core::HasSamplingConfig) for a modulation
/// type by delegating to [`modulation_command`]. An unwrapped modulation
/// targets segment S0 with an immediate transition and an infinite loop.
macro_rules! impl_modulation_datagram {
    ([$($g:tt)*] $ty:ty) => {
        impl<$($g)*> ::tactus_core::Datagram for $ty {
            fn produce(
                &self,
                geometry: &::tactus_core::Geometry,
            ) -> ::tactus_core::Result<::tactus_core::Command> {
                $crate::modulation_command(
                    self,
                    geometry,
                    ::tactus_core::Segment::S0,
                    ::tactus_core::TransitionMode::Immediate,
                    ::tactus_core::LoopBehavior::Infinite,
                )
            }
        }

        impl<$($g)*> ::tactus_core::DatagramS for $ty {
            fn produce_with_segment(
                &self,
                geometry: &::tactus_core::Geometry,
                segment: ::tactus_core::Segment,
                transition: ::tactus_core::TransitionMode,
            ) -> ::tactus_core::Result<::tactus_core::Command> {
                $crate::modulation_command(
                    self,
                    geometry,
                    segment,
                    transition,
                    ::tactus_core::LoopBehavior::Infinite,
                )
            }
        }

        impl<$($g)*> ::tactus_core::DatagramL for $ty {
            fn produce_with_loop(
                &self,
                geometry: &::tactus_core::Geometry,
                segment: ::tactus_core::Segment,
                transition: ::tactus_core::TransitionMode,
                loop_behavior: ::tactus_core::LoopBehavior,
            ) -> ::tactus_core::Result<::tactus_core::Command> {
                $crate::modulation_command(self, geometry, segment, transition, loop_behavior)
            }
        }

        impl<$($g)*> ::tactus_core::HasSamplingConfig for $ty {
            fn sampling_config_intensity(
                &self,
            ) -> ::tactus_core::Result<::tactus_core::SamplingConfig> {
                Ok($crate::Modulation::sampling_config(self))
            }

            fn sampling_config_phase(
                &self,
            ) -> ::tactus_core::Result<::tactus_core::SamplingConfig> {
                // Modulation never changes phase; report the slowest
                // possible sampling so phase validity always holds.
                Ok(::tactus_core::SamplingConfig::FREQ_MIN)
            }
        }
    };
    ($ty:ty) => { impl_modulation_datagram!([] $ty); };
}

mod cache;
mod custom;
mod fir;
mod radiation_pressure;
mod sine;
mod square;
mod static_;
mod transform;

pub use cache::Cache;
pub use custom::Custom;
pub use fir::Fir;
pub use radiation_pressure::RadiationPressure;
pub use sine::Sine;
pub use square::Square;
pub use static_::Static;
pub use transform::Transform;

/// An amplitude envelope sampled at a fixed rate.
pub trait Modulation: Send + Sync {
    /// The sampling configuration the buffer plays back at.
    fn sampling_config(&self) -> SamplingConfig;

    /// Compute the amplitude sample buffer.
    fn calc(&self) -> Result<Vec<u8>>;
}

/// Compile a modulation into a [`Command`] targeting `segment`.
///
/// Fails with a driver error when the computed buffer is shorter than two
/// samples.
pub fn modulation_command(
    modulation: &(impl Modulation + ?Sized),
    geometry: &Geometry,
    segment: Segment,
    transition: TransitionMode,
    loop_behavior: LoopBehavior,
) -> Result<Command> {
    let buffer = modulation.calc()?;
    if buffer.len() < 2 {
        return Err(Error::Driver(format!(
            "modulation buffer must contain at least 2 samples, got {}",
            buffer.len()
        )));
    }
    let config = modulation.sampling_config();
    Ok(Command::broadcast(
        geometry,
        Op::WriteModulation {
            segment,
            transition,
            config,
            loop_behavior,
            buffer,
        },
    ))
}

/// Decorator entry points available on every modulation.
pub trait ModulationExt: Modulation + Sized {
    /// Compute the sample buffer at most once; later produces reuse it.
    fn with_cache(self) -> Cache<Self> {
        Cache::new(self)
    }

    /// Post-process each sample through `f` (index, sample) -> sample.
    fn with_transform<F>(self, f: F) -> Transform<Self, F>
    where
        F: Fn(usize, u8) -> u8 + Send + Sync,
    {
        Transform::new(self, f)
    }

    /// Remap amplitudes to their radiation-pressure equivalent curve.
    fn with_radiation_pressure(self) -> RadiationPressure<Self> {
        RadiationPressure::new(self)
    }

    /// Convolve the sample buffer with FIR coefficients.
    fn with_fir(self, coef: impl IntoIterator<Item = f32>) -> Fir<Self> {
        Fir::new(self, coef)
    }
}

impl<M: Modulation> ModulationExt for M {}

pub(crate) use impl_modulation_datagram;

/// Largest sample buffer a modulation segment can hold.
pub const MOD_BUF_SIZE_MAX: usize = 65_536;

/// Resolve a periodic waveform frequency against a sampling configuration.
///
/// Returns the buffer length and the number of waveform cycles the buffer
/// spans. The exact path requires integer frequencies at an
/// integer-valued sampling rate and fails otherwise; the nearest path
/// rounds the buffer length to one full cycle.
pub(crate) fn resolve_periodic(
    freq_hz: f32,
    config: SamplingConfig,
    nearest: bool,
) -> Result<(usize, u64)> {
    let fs = config.freq();
    if !freq_hz.is_finite() || freq_hz <= 0.0 {
        return Err(Error::Driver(format!(
            "modulation frequency must be positive: {freq_hz} Hz"
        )));
    }
    if nearest {
        let n = (fs / freq_hz).round().clamp(2.0, MOD_BUF_SIZE_MAX as f32) as usize;
        return Ok((n, 1));
    }
    if freq_hz.fract() != 0.0 || fs.fract() != 0.0 {
        return Err(Error::Driver(format!(
            "frequency {freq_hz} Hz cannot be sampled exactly at {fs} Hz; use into_nearest()"
        )));
    }
    let f = freq_hz as u64;
    let fs = fs as u64;
    if f * 2 > fs {
        return Err(Error::Driver(format!(
            "modulation frequency {freq_hz} Hz exceeds the Nyquist limit of {} Hz",
            fs / 2
        )));
    }
    let n = fs / gcd(f, fs);
    if n as usize > MOD_BUF_SIZE_MAX {
        return Err(Error::Driver(format!(
            "modulation frequency {freq_hz} Hz requires a buffer of {n} samples, the limit is {MOD_BUF_SIZE_MAX}"
        )));
    }
    Ok((n as usize, f / gcd(f, fs)))
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}
