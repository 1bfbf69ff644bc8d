//! Null gain: silence.

use tactus_core::geometry::Geometry;
use tactus_core::types::Drive;

use crate::{DriveMap, Gain};

/// Drives every transducer with [`Drive::NULL`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Null;

impl Null {
    /// Create a null gain.
    pub const fn new() -> Self {
        Null
    }
}

impl Gain for Null {
    fn calc(&self, geometry: &Geometry) -> tactus_core::Result<DriveMap> {
        Ok(DriveMap::from_fn(geometry, |_, _| Drive::NULL))
    }
}

impl_gain_datagram!(Null);
