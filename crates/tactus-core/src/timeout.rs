//! Cross-cutting send-option decorators.
//!
//! [`WithTimeout`] and [`WithParallelThreshold`] wrap any datagram and
//! attach per-send hints that override the controller defaults for one
//! send. Wrapping is idempotent: re-wrapping simply replaces the override,
//! the outermost wrapper wins.

use std::time::Duration;

use crate::command::{Command, TimeoutOverride};
use crate::datagram::Datagram;
use crate::error::Result;
use crate::geometry::Geometry;

/// Overrides the acknowledgment timeout for one send.
///
/// `with_timeout(None)` explicitly disables the override so the device
/// default applies instead of the controller default.
#[derive(Debug, Clone)]
pub struct WithTimeout<D: Datagram> {
    inner: D,
    timeout: Option<Duration>,
}

impl<D: Datagram> WithTimeout<D> {
    /// Wrap `inner` with a timeout override.
    pub fn new(inner: D, timeout: Option<Duration>) -> Self {
        WithTimeout { inner, timeout }
    }
}

impl<D: Datagram> Datagram for WithTimeout<D> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        let mut cmd = self.inner.produce(geometry)?;
        cmd.set_timeout(match self.timeout {
            Some(timeout) => TimeoutOverride::After(timeout),
            None => TimeoutOverride::Disabled,
        });
        Ok(cmd)
    }
}

/// Overrides the parallel-computation threshold for one send.
///
/// The threshold is an advisory hint forwarded to the link: commands
/// spanning at least this many devices may be encoded in parallel.
#[derive(Debug, Clone)]
pub struct WithParallelThreshold<D: Datagram> {
    inner: D,
    threshold: usize,
}

impl<D: Datagram> WithParallelThreshold<D> {
    /// Wrap `inner` with a parallel-threshold override.
    pub fn new(inner: D, threshold: usize) -> Self {
        WithParallelThreshold { inner, threshold }
    }
}

impl<D: Datagram> Datagram for WithParallelThreshold<D> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        let mut cmd = self.inner.produce(geometry)?;
        cmd.set_parallel_threshold(self.threshold);
        Ok(cmd)
    }
}

/// Extension methods attaching send-option overrides to any datagram.
pub trait SendOptionExt: Datagram + Sized {
    /// Override the acknowledgment timeout for this send; `None`
    /// explicitly disables the override (device default applies).
    fn with_timeout(self, timeout: Option<Duration>) -> WithTimeout<Self> {
        WithTimeout::new(self, timeout)
    }

    /// Override the parallel-computation threshold for this send.
    fn with_parallel_threshold(self, threshold: usize) -> WithParallelThreshold<Self> {
        WithParallelThreshold::new(self, threshold)
    }
}

impl<D: Datagram> SendOptionExt for D {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Op;
    use crate::geometry::{ArrayUnit, Point3};

    struct Marker;

    impl Datagram for Marker {
        fn produce(&self, geometry: &Geometry) -> Result<Command> {
            Ok(Command::broadcast(geometry, Op::Clear))
        }
    }

    fn geometry() -> Geometry {
        Geometry::new([ArrayUnit::new(Point3::ORIGIN)])
    }

    #[test]
    fn timeout_override_set() {
        let cmd = Marker
            .with_timeout(Some(Duration::from_millis(50)))
            .produce(&geometry())
            .unwrap();
        assert_eq!(
            cmd.timeout(),
            TimeoutOverride::After(Duration::from_millis(50))
        );
    }

    #[test]
    fn timeout_none_disables() {
        let cmd = Marker.with_timeout(None).produce(&geometry()).unwrap();
        assert_eq!(cmd.timeout(), TimeoutOverride::Disabled);
    }

    #[test]
    fn rewrapping_outermost_wins() {
        let cmd = Marker
            .with_timeout(Some(Duration::from_millis(50)))
            .with_timeout(Some(Duration::from_millis(10)))
            .produce(&geometry())
            .unwrap();
        assert_eq!(
            cmd.timeout(),
            TimeoutOverride::After(Duration::from_millis(10))
        );
    }

    #[test]
    fn parallel_threshold_set() {
        let cmd = Marker
            .with_parallel_threshold(8)
            .produce(&geometry())
            .unwrap();
        assert_eq!(cmd.parallel_threshold(), Some(8));
    }

    #[test]
    fn unwrapped_has_no_overrides() {
        let cmd = Marker.produce(&geometry()).unwrap();
        assert_eq!(cmd.timeout(), TimeoutOverride::Unset);
        assert_eq!(cmd.parallel_threshold(), None);
    }
}
