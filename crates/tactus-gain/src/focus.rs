//! Single-focus gain.

use tactus_core::geometry::{Geometry, Point3};
use tactus_core::types::{Intensity, Phase};

use crate::{DriveMap, Gain};

/// Focuses all transducers on a single point.
///
/// Each transducer's phase compensates its path length to the focal
/// point, so all wavefronts arrive in phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Focus {
    pos: Point3,
    intensity: Intensity,
    phase_offset: Phase,
}

impl Focus {
    /// Create a gain focused at `pos` with full intensity.
    pub const fn new(pos: Point3) -> Self {
        Focus {
            pos,
            intensity: Intensity::MAX,
            phase_offset: Phase::ZERO,
        }
    }

    /// Set the emission intensity.
    pub const fn with_intensity(mut self, intensity: Intensity) -> Self {
        self.intensity = intensity;
        self
    }

    /// Add a phase offset to every transducer.
    pub const fn with_phase_offset(mut self, phase_offset: Phase) -> Self {
        self.phase_offset = phase_offset;
        self
    }

    /// The focal position.
    pub const fn pos(&self) -> Point3 {
        self.pos
    }
}

impl Gain for Focus {
    fn calc(&self, geometry: &Geometry) -> tactus_core::Result<DriveMap> {
        Ok(DriveMap::from_fn(geometry, |dev, tr| {
            let dist = (self.pos - tr.position()).norm();
            let phase = Phase::from_rad(dist * dev.wavenumber()) + self.phase_offset;
            tactus_core::Drive::new(phase, self.intensity)
        }))
    }
}

impl_gain_datagram!(Focus);
