//! Compute-once gain decorator.

use parking_lot::Mutex;

use tactus_core::geometry::Geometry;

use crate::{DriveMap, Gain};

/// Caches the inner gain's drive table.
///
/// The inner compute runs at most once per `Cache` instance, lazily on
/// the first produce; every later produce clones the cached tables.
/// Invoking the inner compute a second time through the same instance is
/// a defect.
pub struct Cache<G> {
    inner: G,
    cache: Mutex<Option<DriveMap>>,
}

impl<G: Gain> Cache<G> {
    /// Wrap `inner` in a compute-once cache.
    pub fn new(inner: G) -> Self {
        Cache {
            inner,
            cache: Mutex::new(None),
        }
    }

    /// The cached drive tables, if they have been computed.
    pub fn drives(&self) -> Option<DriveMap> {
        self.cache.lock().clone()
    }
}

impl<G: Gain> Gain for Cache<G> {
    fn calc(&self, geometry: &Geometry) -> tactus_core::Result<DriveMap> {
        let mut cache = self.cache.lock();
        match &*cache {
            Some(map) => Ok(map.clone()),
            None => {
                let map = self.inner.calc(geometry)?;
                *cache = Some(map.clone());
                Ok(map)
            }
        }
    }
}

impl_gain_datagram!([G: Gain] Cache<G>);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{Custom, GainExt};
    use tactus_core::Datagram;
    use tactus_core::geometry::{ArrayUnit, Point3};
    use tactus_core::types::Drive;

    #[test]
    fn inner_computed_exactly_once() {
        let g = Geometry::new([ArrayUnit::new(Point3::ORIGIN)]);
        let calls = AtomicUsize::new(0);
        let gain = Custom::new(|_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Drive::NULL
        })
        .with_cache();

        assert!(gain.drives().is_none());
        for _ in 0..5 {
            gain.produce(&g).unwrap();
        }
        assert_eq!(
            calls.load(Ordering::SeqCst),
            g.num_transducers(),
            "inner compute must run exactly once"
        );
        assert!(gain.drives().is_some());
    }

    #[test]
    fn uncached_recomputes_every_produce() {
        let g = Geometry::new([ArrayUnit::new(Point3::ORIGIN)]);
        let calls = AtomicUsize::new(0);
        let gain = Custom::new(|_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Drive::NULL
        });
        for _ in 0..3 {
            gain.produce(&g).unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3 * g.num_transducers());
    }
}
