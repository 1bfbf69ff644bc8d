//! The `Datagram` trait family -- the polymorphic command abstraction.
//!
//! Anything sendable implements [`Datagram`]: given a geometry, it produces
//! an opaque [`Command`]. Two datagrams can be combined into a tuple and
//! sent atomically; capability traits ([`DatagramS`], [`DatagramL`]) mark
//! datagrams that can additionally target a specific segment or carry a
//! loop behavior, and are consumed by the wrappers in
//! [`segment`](crate::segment).

use crate::command::Command;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::types::{LoopBehavior, Segment, TransitionMode};

/// A geometry-parameterized command.
///
/// `produce` is pure with respect to program state, apart from one-time
/// lazy caches declared by decorators such as the gain/modulation `Cache`.
pub trait Datagram: Send + Sync {
    /// Compile this datagram into a dispatch-ready command.
    fn produce(&self, geometry: &Geometry) -> Result<Command>;
}

impl Datagram for Box<dyn Datagram> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        (**self).produce(geometry)
    }
}

impl<'a, D: Datagram + ?Sized> Datagram for &'a D {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        (**self).produce(geometry)
    }
}

/// A pair of datagrams is itself a datagram: both sides are produced and
/// their commands merged into one atomic send. Only pairs are supported;
/// larger combinations must be sent separately.
impl<D1: Datagram, D2: Datagram> Datagram for (D1, D2) {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        let first = self.0.produce(geometry)?;
        let second = self.1.produce(geometry)?;
        Ok(first.merge(second))
    }
}

/// A datagram whose content can be written into a chosen segment.
pub trait DatagramS: Datagram {
    /// Produce the command with the content targeted at `segment`,
    /// transitioning per `transition`.
    fn produce_with_segment(
        &self,
        geometry: &Geometry,
        segment: Segment,
        transition: TransitionMode,
    ) -> Result<Command>;
}

/// A segment-targetable datagram that can also carry a loop behavior.
pub trait DatagramL: DatagramS {
    /// Produce the command with content, segment, transition, and loop
    /// behavior.
    fn produce_with_loop(
        &self,
        geometry: &Geometry,
        segment: Segment,
        transition: TransitionMode,
        loop_behavior: LoopBehavior,
    ) -> Result<Command>;
}

/// Convenience conversions available on every datagram.
pub trait DatagramExt: Datagram + Sized {
    /// Box this datagram for storage in heterogeneous collections
    /// (group data maps, dynamic sends).
    fn boxed(self) -> Box<dyn Datagram>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<D: Datagram> DatagramExt for D {}
