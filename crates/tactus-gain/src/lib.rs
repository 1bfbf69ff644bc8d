//! tactus-gain: per-transducer drive patterns.
//!
//! A [`Gain`] computes one [`Drive`] (phase + intensity) per transducer for
//! a single instant. Every gain is a [`Datagram`]; it can also target a
//! segment via [`SegmentExt::with_segment`](tactus_core::SegmentExt).
//! Decorators compose:
//!
//! - [`Cache`] computes the drive table at most once per instance.
//! - [`Transform`] post-processes each computed drive.
//!
//! Disabled devices are excluded from computation entirely: the compute
//! function is never invoked for their transducers and they receive no
//! drive table.

use tactus_core::command::{Command, Op};
use tactus_core::error::{Error, Result};
use tactus_core::geometry::{Device, Geometry, Transducer};
use tactus_core::types::{Drive, Segment, TransitionMode};

/// Implements [`Datagram`](tactus_core::Datagram) and
/// [`DatagramS`](tactus_core::DatagramS) for a gain type by delegating to
/// [`gain_command`]. An unwrapped gain targets segment S0 with an
/// immediate transition.
macro_rules! impl_gain_datagram {
    ([$($g:tt)*] $ty:ty) => {
        impl<$($g)*> ::tactus_core::Datagram for $ty {
            fn produce(
                &self,
                geometry: &::tactus_core::Geometry,
            ) -> ::tactus_core::Result<::tactus_core::Command> {
                $crate::gain_command(
                    self,
                    geometry,
                    ::tactus_core::Segment::S0,
                    ::tactus_core::TransitionMode::Immediate,
                )
            }
        }

        impl<$($g)*> ::tactus_core::DatagramS for $ty {
            fn produce_with_segment(
                &self,
                geometry: &::tactus_core::Geometry,
                segment: ::tactus_core::Segment,
                transition: ::tactus_core::TransitionMode,
            ) -> ::tactus_core::Result<::tactus_core::Command> {
                $crate::gain_command(self, geometry, segment, transition)
            }
        }
    };
    ($ty:ty) => { impl_gain_datagram!([] $ty); };
}

mod cache;
mod custom;
mod focus;
mod null;
mod plane;
mod transform;
mod uniform;

pub use cache::Cache;
pub use custom::Custom;
pub use focus::Focus;
pub use null::Null;
pub use plane::Plane;
pub use transform::Transform;
pub use uniform::Uniform;

/// A per-transducer drive pattern for one instant.
pub trait Gain: Send + Sync {
    /// Compute the drive tables for the enabled devices of `geometry`.
    fn calc(&self, geometry: &Geometry) -> Result<DriveMap>;
}

/// Computed drive tables, one per enabled device.
///
/// Devices that were disabled (or excluded by group routing) have no
/// entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DriveMap {
    tables: Vec<Option<Vec<Drive>>>,
}

impl DriveMap {
    /// Compute a drive map by invoking `f` for every transducer of every
    /// enabled device.
    pub fn from_fn(
        geometry: &Geometry,
        mut f: impl FnMut(&Device, &Transducer) -> Drive,
    ) -> Self {
        let mut tables = vec![None; geometry.num_devices()];
        for dev in geometry.devices() {
            tables[dev.idx()] = Some(dev.iter().map(|tr| f(dev, tr)).collect());
        }
        DriveMap { tables }
    }

    /// The drive table of a device, if it was computed.
    pub fn get(&self, dev_idx: usize) -> Option<&[Drive]> {
        self.tables.get(dev_idx).and_then(|t| t.as_deref())
    }

    /// Number of device slots (enabled or not).
    pub fn num_devices(&self) -> usize {
        self.tables.len()
    }

    /// Map every computed drive through `f`, per device and transducer.
    ///
    /// Only devices that are enabled in `geometry` and have a computed
    /// table are touched.
    pub fn transform(
        mut self,
        geometry: &Geometry,
        mut f: impl FnMut(&Device, &Transducer, Drive) -> Drive,
    ) -> Self {
        for dev in geometry.devices() {
            if let Some(Some(table)) = self.tables.get_mut(dev.idx()) {
                for (tr, drive) in dev.iter().zip(table.iter_mut()) {
                    *drive = f(dev, tr, *drive);
                }
            }
        }
        self
    }
}

/// Compile a gain into a [`Command`] targeting `segment`.
///
/// Fails with a driver error when a computed drive table does not match
/// the device's transducer count.
pub fn gain_command(
    gain: &(impl Gain + ?Sized),
    geometry: &Geometry,
    segment: Segment,
    transition: TransitionMode,
) -> Result<Command> {
    let drives = gain.calc(geometry)?;
    Command::try_per_device(geometry, |dev| {
        let table = drives.get(dev.idx()).ok_or_else(|| {
            Error::Driver(format!(
                "gain produced no drive table for device {}",
                dev.idx()
            ))
        })?;
        if table.len() != dev.num_transducers() {
            return Err(Error::Driver(format!(
                "gain drive table for device {} has {} entries, expected {}",
                dev.idx(),
                table.len(),
                dev.num_transducers()
            )));
        }
        Ok(Op::WriteGain {
            segment,
            transition,
            drives: table.to_vec(),
        })
    })
}

/// Decorator entry points available on every gain.
pub trait GainExt: Gain + Sized {
    /// Compute the drive table at most once; later produces reuse it.
    fn with_cache(self) -> Cache<Self> {
        Cache::new(self)
    }

    /// Post-process each computed drive through `f`.
    fn with_transform<F>(self, f: F) -> Transform<Self, F>
    where
        F: Fn(&Device, &Transducer, Drive) -> Drive + Send + Sync,
    {
        Transform::new(self, f)
    }
}

impl<G: Gain> GainExt for G {}

pub(crate) use impl_gain_datagram;

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_core::geometry::{ArrayUnit, Point3, UNIT_TRANSDUCERS};

    #[test]
    fn drive_map_skips_disabled() {
        let mut g = Geometry::new([
            ArrayUnit::new(Point3::ORIGIN),
            ArrayUnit::new(Point3::new(200.0, 0.0, 0.0)),
        ]);
        g.get_mut(0).unwrap().set_enable(false);
        let map = DriveMap::from_fn(&g, |_, _| Drive::NULL);
        assert!(map.get(0).is_none());
        assert_eq!(map.get(1).unwrap().len(), UNIT_TRANSDUCERS);
    }

    #[test]
    fn gain_command_validates_table_length() {
        struct Broken;

        impl Gain for Broken {
            fn calc(&self, geometry: &Geometry) -> Result<DriveMap> {
                let mut map = DriveMap::from_fn(geometry, |_, _| Drive::NULL);
                if let Some(Some(table)) = map.tables.get_mut(0) {
                    table.pop();
                }
                Ok(map)
            }
        }

        let g = Geometry::new([ArrayUnit::new(Point3::ORIGIN)]);
        let result = gain_command(&Broken, &g, Segment::S0, TransitionMode::Immediate);
        assert!(matches!(result, Err(Error::Driver(_))));
    }
}
