//! Plane-wave gain.

use tactus_core::geometry::{Geometry, Point3};
use tactus_core::types::{Drive, Intensity, Phase};

use crate::{DriveMap, Gain};

/// Emits a plane wave in a given direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    dir: Point3,
    intensity: Intensity,
    phase_offset: Phase,
}

impl Plane {
    /// Create a plane wave traveling along `dir` (normalized internally).
    pub fn new(dir: Point3) -> Self {
        Plane {
            dir: dir.normalized(),
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
}

impl Gain for Plane {
    fn calc(&self, geometry: &Geometry) -> tactus_core::Result<DriveMap> {
        Ok(DriveMap::from_fn(geometry, |dev, tr| {
            let phase =
                Phase::from_rad(self.dir.dot(tr.position()) * dev.wavenumber()) + self.phase_offset;
            Drive::new(phase, self.intensity)
        }))
    }
}

impl_gain_datagram!(Plane);

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_core::geometry::ArrayUnit;

    #[test]
    fn axial_plane_wave_is_uniform() {
        // Direction perpendicular to the (planar) array: every transducer
        // has the same projection, hence the same phase.
        let g = Geometry::new([ArrayUnit::new(Point3::ORIGIN)]);
        let map = Plane::new(Point3::new(0.0, 0.0, 1.0)).calc(&g).unwrap();
        let table = map.get(0).unwrap();
        assert!(table.iter().all(|d| d.phase == table[0].phase));
    }

    #[test]
    fn oblique_plane_wave_tilts_phase() {
        let g = Geometry::new([ArrayUnit::new(Point3::ORIGIN)]);
        let map = Plane::new(Point3::new(1.0, 0.0, 1.0)).calc(&g).unwrap();
        let table = map.get(0).unwrap();
        assert!(table.iter().any(|d| d.phase != table[0].phase));
    }
}
