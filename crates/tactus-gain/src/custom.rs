//! Function-backed gain.

use tactus_core::geometry::{Device, Geometry, Transducer};
use tactus_core::types::Drive;

use crate::{DriveMap, Gain};

/// Computes each transducer's drive with a caller-provided function.
///
/// The function is invoked once per transducer of every enabled device,
/// each time the gain is produced. Wrap with
/// [`with_cache`](crate::GainExt::with_cache) to compute only once.
pub struct Custom<F> {
    f: F,
}

impl<F: Fn(&Device, &Transducer) -> Drive> Custom<F> {
    /// Create a gain from a per-transducer function.
    pub fn new(f: F) -> Self {
        Custom { f }
    }
}

impl<F: Fn(&Device, &Transducer) -> Drive + Send + Sync> Gain for Custom<F> {
    fn calc(&self, geometry: &Geometry) -> tactus_core::Result<DriveMap> {
        Ok(DriveMap::from_fn(geometry, &self.f))
    }
}

impl_gain_datagram!([F: Fn(&Device, &Transducer) -> Drive + Send + Sync] Custom<F>);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use tactus_core::geometry::{ArrayUnit, Point3, UNIT_TRANSDUCERS};
    use tactus_core::types::{Intensity, Phase};

    #[test]
    fn invoked_per_transducer() {
        let g = Geometry::new([ArrayUnit::new(Point3::ORIGIN)]);
        let calls = AtomicUsize::new(0);
        let gain = Custom::new(|_, tr: &Transducer| {
            calls.fetch_add(1, Ordering::SeqCst);
            Drive::new(Phase::new(tr.idx() as u8), Intensity::MAX)
        });
        let map = gain.calc(&g).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), UNIT_TRANSDUCERS);
        assert_eq!(map.get(0).unwrap()[5].phase, Phase::new(5));
    }

    #[test]
    fn never_invoked_for_disabled_devices() {
        let mut g = Geometry::new([
            ArrayUnit::new(Point3::ORIGIN),
            ArrayUnit::new(Point3::new(200.0, 0.0, 0.0)),
        ]);
        g.get_mut(0).unwrap().set_enable(false);
        let gain = Custom::new(|dev: &Device, _: &Transducer| {
            assert_ne!(dev.idx(), 0, "compute must skip disabled devices");
            Drive::NULL
        });
        let map = gain.calc(&g).unwrap();
        assert!(map.get(0).is_none());
        assert!(map.get(1).is_some());
    }
}
