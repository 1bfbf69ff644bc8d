//! Drive post-processing decorator.

use tactus_core::geometry::{Device, Geometry, Transducer};
use tactus_core::types::Drive;

use crate::{DriveMap, Gain};

/// Post-processes every drive computed by the inner gain.
///
/// The transform function is only invoked for enabled devices; disabled
/// devices are skipped by the inner compute and never reach it.
pub struct Transform<G, F> {
    inner: G,
    f: F,
}

impl<G: Gain, F: Fn(&Device, &Transducer, Drive) -> Drive> Transform<G, F> {
    /// Wrap `inner` with a per-drive transform.
    pub fn new(inner: G, f: F) -> Self {
        Transform { inner, f }
    }
}

impl<G, F> Gain for Transform<G, F>
where
    G: Gain,
    F: Fn(&Device, &Transducer, Drive) -> Drive + Send + Sync,
{
    fn calc(&self, geometry: &Geometry) -> tactus_core::Result<DriveMap> {
        Ok(self.inner.calc(geometry)?.transform(geometry, &self.f))
    }
}

impl_gain_datagram!(
    [G: Gain, F: Fn(&Device, &Transducer, Drive) -> Drive + Send + Sync] Transform<G, F>
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GainExt, Uniform};
    use tactus_core::geometry::{ArrayUnit, Point3};
    use tactus_core::types::{Intensity, Phase};

    #[test]
    fn applies_to_every_drive() {
        let g = Geometry::new([ArrayUnit::new(Point3::ORIGIN)]);
        let gain = Uniform::new(Intensity::new(0x80))
            .with_transform(|_, _, d| Drive::new(d.phase + Phase::PI, d.intensity));
        let map = gain.calc(&g).unwrap();
        assert!(map.get(0).unwrap().iter().all(|d| d.phase == Phase::PI));
    }

    #[test]
    fn never_invoked_for_disabled_devices() {
        let mut g = Geometry::new([
            ArrayUnit::new(Point3::ORIGIN),
            ArrayUnit::new(Point3::new(200.0, 0.0, 0.0)),
        ]);
        g.get_mut(1).unwrap().set_enable(false);
        let gain = Uniform::new(Intensity::MAX).with_transform(|dev: &Device, _, d| {
            assert_ne!(dev.idx(), 1, "transform must skip disabled devices");
            d
        });
        let map = gain.calc(&g).unwrap();
        assert!(map.get(1).is_none());
    }
}
