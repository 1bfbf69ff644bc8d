//! Firmware-facing value types.
//!
//! These are the validated, range-checked descriptors that make up every
//! command the device firmware understands: per-transducer drives, the
//! double-buffer segment identifiers, segment transition triggers, and
//! loop behaviors for finite playback.

use std::fmt;
use std::num::NonZeroU32;

use crate::error::{Error, Result};

/// Phase of a transducer drive signal, mapped onto 8 bits.
///
/// The full circle (2π rad) corresponds to 256 steps, so the type wraps
/// naturally on overflow. `Phase(0)` is 0 rad, `Phase(128)` is π rad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Phase(u8);

impl Phase {
    /// Phase of 0 rad.
    pub const ZERO: Phase = Phase(0);

    /// Phase of π rad.
    pub const PI: Phase = Phase(128);

    /// Create a phase from a raw 8-bit value.
    pub const fn new(value: u8) -> Self {
        Phase(value)
    }

    /// Create a phase from an angle in radians, wrapping onto the circle.
    pub fn from_rad(rad: f32) -> Self {
        let steps = rad / (2.0 * std::f32::consts::PI) * 256.0;
        Phase((steps.round() as i64).rem_euclid(256) as u8)
    }

    /// Return the raw 8-bit value.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Return the phase as an angle in radians, in `[0, 2π)`.
    pub fn to_rad(self) -> f32 {
        f32::from(self.0) / 256.0 * 2.0 * std::f32::consts::PI
    }
}

impl std::ops::Add for Phase {
    type Output = Phase;

    fn add(self, rhs: Phase) -> Phase {
        Phase(self.0.wrapping_add(rhs.0))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Emission intensity of a transducer, 0 (off) to 255 (full power).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Intensity(u8);

impl Intensity {
    /// No emission.
    pub const MIN: Intensity = Intensity(0);

    /// Full emission.
    pub const MAX: Intensity = Intensity(0xFF);

    /// Create an intensity from a raw 8-bit value.
    pub const fn new(value: u8) -> Self {
        Intensity(value)
    }

    /// Return the raw 8-bit value.
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A per-transducer drive: phase and intensity for one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Drive {
    /// Drive phase.
    pub phase: Phase,
    /// Drive intensity.
    pub intensity: Intensity,
}

impl Drive {
    /// The canonical zero drive: phase 0, intensity 0.
    pub const NULL: Drive = Drive {
        phase: Phase::ZERO,
        intensity: Intensity::MIN,
    };

    /// Create a drive from a phase and an intensity.
    pub const fn new(phase: Phase, intensity: Intensity) -> Self {
        Drive { phase, intensity }
    }
}

/// One of the two double-buffer slots each firmware subsystem holds.
///
/// Exactly one segment is active per subsystem (modulation, gain, foci-STM,
/// gain-STM) per device at any time; the other may be written without
/// disturbing the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Segment {
    /// Segment 0. Active after power-on and after `Clear`.
    #[default]
    S0,
    /// Segment 1.
    S1,
}

impl Segment {
    /// Return the other segment.
    pub const fn other(self) -> Segment {
        match self {
            Segment::S0 => Segment::S1,
            Segment::S1 => Segment::S0,
        }
    }

    /// Return the buffer index (0 or 1) of this segment.
    pub const fn index(self) -> usize {
        match self {
            Segment::S0 => 0,
            Segment::S1 => 1,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::S0 => write!(f, "S0"),
            Segment::S1 => write!(f, "S1"),
        }
    }
}

/// A GPIO input pin usable as a segment transition trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpioIn {
    /// Input pin 0.
    I0,
    /// Input pin 1.
    I1,
    /// Input pin 2.
    I2,
    /// Input pin 3.
    I3,
}

/// When a staged segment becomes the active one.
///
/// `Later` is the canonical "content update only" sentinel: the staged
/// buffer is written but no transition is requested and the active segment
/// stays where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionMode {
    /// Transition when the active segment's playback index wraps to 0.
    SyncIdx,
    /// Transition when the distributed-clock system time (in nanoseconds)
    /// reaches the given value.
    SysTime(u64),
    /// Transition on an edge of the given GPIO input pin.
    Gpio(GpioIn),
    /// Transition is driven by an external synchronization signal.
    Ext,
    /// Transition immediately once the content is written.
    Immediate,
    /// Do not transition: update the staged content only.
    Later,
}

/// Transition triggers valid for finite-loop playback.
///
/// A finite loop must start from a well-defined instant, so the
/// content-only `Later` sentinel and the free-running `Ext`/`Immediate`
/// modes are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiniteTransitionMode {
    /// Transition when the active segment's playback index wraps to 0.
    SyncIdx,
    /// Transition at the given distributed-clock system time (nanoseconds).
    SysTime(u64),
    /// Transition on an edge of the given GPIO input pin.
    Gpio(GpioIn),
}

impl From<FiniteTransitionMode> for TransitionMode {
    fn from(mode: FiniteTransitionMode) -> TransitionMode {
        match mode {
            FiniteTransitionMode::SyncIdx => TransitionMode::SyncIdx,
            FiniteTransitionMode::SysTime(t) => TransitionMode::SysTime(t),
            FiniteTransitionMode::Gpio(pin) => TransitionMode::Gpio(pin),
        }
    }
}

/// How many times a staged modulation or STM pattern plays back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoopBehavior {
    /// Loop forever.
    #[default]
    Infinite,
    /// Play back exactly the given number of times, then hold.
    Finite(NonZeroU32),
}

impl LoopBehavior {
    /// Play back exactly once. Alias for `Finite(1)`.
    pub const ONCE: LoopBehavior = LoopBehavior::Finite(NonZeroU32::MIN);

    /// Create a finite loop behavior.
    ///
    /// Returns [`Error::CantBeZero`] when `count` is 0.
    pub fn finite(count: u32) -> Result<LoopBehavior> {
        NonZeroU32::new(count)
            .map(LoopBehavior::Finite)
            .ok_or(Error::CantBeZero(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_from_rad_wraps() {
        assert_eq!(Phase::from_rad(0.0), Phase::ZERO);
        assert_eq!(Phase::from_rad(std::f32::consts::PI), Phase::PI);
        assert_eq!(Phase::from_rad(2.0 * std::f32::consts::PI), Phase::ZERO);
        assert_eq!(Phase::from_rad(-std::f32::consts::PI), Phase::PI);
    }

    #[test]
    fn phase_round_trip() {
        for v in [0u8, 1, 64, 128, 200, 255] {
            let p = Phase::new(v);
            assert_eq!(Phase::from_rad(p.to_rad()), p);
        }
    }

    #[test]
    fn phase_add_wraps() {
        assert_eq!(Phase::new(200) + Phase::new(100), Phase::new(44));
        assert_eq!(Phase::new(128) + Phase::new(128), Phase::ZERO);
    }

    #[test]
    fn drive_null_is_zero() {
        assert_eq!(Drive::NULL.phase.value(), 0);
        assert_eq!(Drive::NULL.intensity.value(), 0);
    }

    #[test]
    fn segment_other() {
        assert_eq!(Segment::S0.other(), Segment::S1);
        assert_eq!(Segment::S1.other(), Segment::S0);
    }

    #[test]
    fn loop_behavior_once_is_finite_one() {
        assert_eq!(LoopBehavior::ONCE, LoopBehavior::finite(1).unwrap());
    }

    #[test]
    fn loop_behavior_zero_rejected() {
        assert!(matches!(
            LoopBehavior::finite(0),
            Err(Error::CantBeZero(0))
        ));
    }

    #[test]
    fn finite_transition_converts() {
        assert_eq!(
            TransitionMode::from(FiniteTransitionMode::SyncIdx),
            TransitionMode::SyncIdx
        );
        assert_eq!(
            TransitionMode::from(FiniteTransitionMode::Gpio(GpioIn::I2)),
            TransitionMode::Gpio(GpioIn::I2)
        );
        assert_eq!(
            TransitionMode::from(FiniteTransitionMode::SysTime(1_000)),
            TransitionMode::SysTime(1_000)
        );
    }
}
