//! Segment targeting, transition wrapping, and loop behavior.
//!
//! Each firmware subsystem (modulation, gain, foci-STM, gain-STM) keeps two
//! content buffers per device and plays back exactly one of them -- the
//! active segment. The wrappers here stage content into a chosen segment
//! and control when, and for how many repetitions, the staged segment
//! becomes active:
//!
//! - [`WithSegment`] writes content into a segment and requests a
//!   transition (or none, with [`TransitionMode::Later`]).
//! - [`WithLoopBehavior`] / [`WithFiniteLoop`] additionally attach a
//!   playback loop count.
//! - [`SwapSegment`] requests a segment flip without writing any content.

use std::num::NonZeroU32;

use crate::command::{Command, Op};
use crate::datagram::{Datagram, DatagramL, DatagramS};
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::types::{FiniteTransitionMode, LoopBehavior, Segment, TransitionMode};

/// Wraps a datagram to stage its content into a specific segment.
///
/// With [`TransitionMode::Later`] only the staged content is updated and
/// the active segment is untouched; any other mode requests a transition
/// to `segment` per that mode's trigger semantics.
#[derive(Debug, Clone)]
pub struct WithSegment<D: DatagramS> {
    inner: D,
    segment: Segment,
    transition: TransitionMode,
}

impl<D: DatagramS> WithSegment<D> {
    /// Wrap `inner` to target `segment` with the given transition trigger.
    pub fn new(inner: D, segment: Segment, transition: TransitionMode) -> Self {
        WithSegment {
            inner,
            segment,
            transition,
        }
    }
}

impl<D: DatagramS> Datagram for WithSegment<D> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        self.inner
            .produce_with_segment(geometry, self.segment, self.transition)
    }
}

/// Wraps a loop-capable datagram with a segment, transition, and loop
/// behavior.
#[derive(Debug, Clone)]
pub struct WithLoopBehavior<D: DatagramL> {
    inner: D,
    segment: Segment,
    transition: TransitionMode,
    loop_behavior: LoopBehavior,
}

impl<D: DatagramL> WithLoopBehavior<D> {
    /// Wrap `inner` with the full set of staging parameters.
    pub fn new(
        inner: D,
        segment: Segment,
        transition: TransitionMode,
        loop_behavior: LoopBehavior,
    ) -> Self {
        WithLoopBehavior {
            inner,
            segment,
            transition,
            loop_behavior,
        }
    }
}

impl<D: DatagramL> Datagram for WithLoopBehavior<D> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        self.inner.produce_with_loop(
            geometry,
            self.segment,
            self.transition,
            self.loop_behavior,
        )
    }
}

/// Wraps a loop-capable datagram for finite playback.
///
/// A finite loop requires a loop count of at least 1 (validated
/// client-side) and a [`FiniteTransitionMode`], since playback must start
/// from a well-defined trigger.
#[derive(Debug, Clone)]
pub struct WithFiniteLoop<D: DatagramL> {
    inner: D,
    segment: Segment,
    transition: FiniteTransitionMode,
    loop_count: NonZeroU32,
}

impl<D: DatagramL> WithFiniteLoop<D> {
    /// Wrap `inner` for finite playback.
    ///
    /// Returns [`Error::CantBeZero`] when `loop_count` is 0.
    pub fn new(
        inner: D,
        segment: Segment,
        transition: FiniteTransitionMode,
        loop_count: u32,
    ) -> Result<Self> {
        let loop_count = NonZeroU32::new(loop_count).ok_or(Error::CantBeZero(0))?;
        Ok(WithFiniteLoop {
            inner,
            segment,
            transition,
            loop_count,
        })
    }
}

impl<D: DatagramL> Datagram for WithFiniteLoop<D> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        self.inner.produce_with_loop(
            geometry,
            self.segment,
            self.transition.into(),
            LoopBehavior::Finite(self.loop_count),
        )
    }
}

/// Extension methods for segment-targetable datagrams.
pub trait SegmentExt: DatagramS + Sized {
    /// Stage this datagram's content into `segment`, transitioning per
    /// `transition`.
    fn with_segment(self, segment: Segment, transition: TransitionMode) -> WithSegment<Self> {
        WithSegment::new(self, segment, transition)
    }
}

impl<D: DatagramS> SegmentExt for D {}

/// Extension methods for loop-capable datagrams.
pub trait LoopExt: DatagramL + Sized {
    /// Stage this datagram with an explicit loop behavior.
    fn with_loop_behavior(
        self,
        segment: Segment,
        transition: TransitionMode,
        loop_behavior: LoopBehavior,
    ) -> WithLoopBehavior<Self> {
        WithLoopBehavior::new(self, segment, transition, loop_behavior)
    }

    /// Stage this datagram for finite playback.
    ///
    /// Returns [`Error::CantBeZero`] when `loop_count` is 0.
    fn with_finite_loop(
        self,
        segment: Segment,
        transition: FiniteTransitionMode,
        loop_count: u32,
    ) -> Result<WithFiniteLoop<Self>> {
        WithFiniteLoop::new(self, segment, transition, loop_count)
    }
}

impl<D: DatagramL> LoopExt for D {}

/// Requests an active-segment flip for one subsystem, independent of
/// content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwapSegment {
    /// Flip the active gain segment.
    Gain(Segment),
    /// Flip the active modulation segment.
    Modulation(Segment, TransitionMode),
    /// Flip the active foci-STM segment.
    FociStm(Segment, TransitionMode),
    /// Flip the active gain-STM segment.
    GainStm(Segment, TransitionMode),
}

impl Datagram for SwapSegment {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        let op = match *self {
            SwapSegment::Gain(segment) => Op::SwapGainSegment(segment),
            SwapSegment::Modulation(segment, transition) => {
                Op::SwapModulationSegment(segment, transition)
            }
            SwapSegment::FociStm(segment, transition) => {
                Op::SwapFociStmSegment(segment, transition)
            }
            SwapSegment::GainStm(segment, transition) => {
                Op::SwapGainStmSegment(segment, transition)
            }
        };
        Ok(Command::broadcast(geometry, op))
    }
}
