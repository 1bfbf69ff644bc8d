//! Uniform gain: the same drive on every transducer.

use tactus_core::geometry::Geometry;
use tactus_core::types::{Drive, Intensity, Phase};

use crate::{DriveMap, Gain};

/// Drives every transducer with the same intensity and phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    intensity: Intensity,
    phase: Phase,
}

impl Uniform {
    /// Create a uniform gain with the given intensity and phase 0.
    pub const fn new(intensity: Intensity) -> Self {
        Uniform {
            intensity,
            phase: Phase::ZERO,
        }
    }

    /// Set the phase.
    pub const fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// The configured intensity.
    pub const fn intensity(&self) -> Intensity {
        self.intensity
    }

    /// The configured phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }
}

impl Gain for Uniform {
    fn calc(&self, geometry: &Geometry) -> tactus_core::Result<DriveMap> {
        let drive = Drive::new(self.phase, self.intensity);
        Ok(DriveMap::from_fn(geometry, |_, _| drive))
    }
}

impl_gain_datagram!(Uniform);
