//! Per-device command routing within one atomic send.
//!
//! A [`Group`] routes distinct sub-datagrams to distinct devices: a key map
//! classifies each enabled device, and every produced key selects an entry
//! of the data map. Devices mapped to `None` (and disabled devices) are
//! excluded and receive nothing. Each entry is produced exactly once --
//! per key, not per device -- so devices sharing a key share one computed
//! result.

use crate::command::Command;
use crate::datagram::Datagram;
use crate::error::{Error, Result};
use crate::geometry::{Device, Geometry};

/// Routes sub-datagrams to devices keyed by a per-device classification
/// function.
///
/// Built in builder style; registering the same key twice fails with
/// [`Error::KeyAlreadyExists`]. At produce time every key emitted by the
/// key map must have an entry, otherwise the whole send fails with
/// [`Error::UnknownGroupKey`] and no device is updated.
///
/// # Example
///
/// ```
/// use tactus_core::{Clear, Group, Synchronize};
///
/// let group = Group::new(|dev| match dev.idx() {
///     0 => Some("left"),
///     1 => Some("right"),
///     _ => None,
/// })
/// .set("left", Clear::new())?
/// .set("right", Synchronize::new())?;
/// # Ok::<(), tactus_core::Error>(())
/// ```
pub struct Group<K, F> {
    key_map: F,
    entries: Vec<(K, Box<dyn Datagram>)>,
}

impl<K, F> Group<K, F>
where
    K: Eq,
    F: Fn(&Device) -> Option<K>,
{
    /// Create a group with the given per-device key map.
    ///
    /// The key map is evaluated for enabled devices only; returning `None`
    /// excludes the device from this send.
    pub fn new(key_map: F) -> Self {
        Group {
            key_map,
            entries: Vec::new(),
        }
    }

    /// Register the datagram to send to all devices mapped to `key`.
    ///
    /// A pair of datagrams may be registered by passing a 2-tuple.
    /// Returns [`Error::KeyAlreadyExists`] when `key` is already
    /// registered.
    pub fn set(mut self, key: K, datagram: impl Datagram + 'static) -> Result<Self> {
        if self.entries.iter().any(|(k, _)| *k == key) {
            return Err(Error::KeyAlreadyExists);
        }
        self.entries.push((key, Box::new(datagram)));
        Ok(self)
    }

    /// Register one or two boxed datagrams for `key`.
    ///
    /// This is the dynamic-arity entry point: any arity other than 1 or 2
    /// fails with [`Error::InvalidDatagramType`].
    pub fn set_boxed(mut self, key: K, mut datagrams: Vec<Box<dyn Datagram>>) -> Result<Self> {
        if self.entries.iter().any(|(k, _)| *k == key) {
            return Err(Error::KeyAlreadyExists);
        }
        let entry: Box<dyn Datagram> = match datagrams.len() {
            1 => datagrams.pop().expect("length checked"),
            2 => {
                let second = datagrams.pop().expect("length checked");
                let first = datagrams.pop().expect("length checked");
                Box::new((first, second))
            }
            _ => return Err(Error::InvalidDatagramType),
        };
        self.entries.push((key, entry));
        Ok(self)
    }
}

impl<K, F> Datagram for Group<K, F>
where
    K: Eq + Send + Sync,
    F: Fn(&Device) -> Option<K> + Send + Sync,
{
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        // Classify every device. Disabled devices never reach the key map.
        let keys: Vec<Option<K>> = geometry
            .iter()
            .map(|dev| {
                if dev.enable() {
                    (self.key_map)(dev)
                } else {
                    None
                }
            })
            .collect();

        // Every emitted key must have an entry; checked before anything is
        // produced so a failed send updates no device.
        for key in keys.iter().flatten() {
            if !self.entries.iter().any(|(k, _)| k == key) {
                return Err(Error::UnknownGroupKey);
            }
        }

        // Produce each entry once, against a geometry view restricted to
        // the devices carrying that entry's key.
        let mut merged = Command::new(geometry.num_devices());
        for (key, datagram) in &self.entries {
            let masked = geometry.masked(|dev| keys[dev.idx()].as_ref() == Some(key));
            let cmd = datagram.produce(&masked)?;
            merged = merged.merge(cmd);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Op;
    use crate::geometry::{ArrayUnit, Point3};
    use crate::utilities::{Clear, Synchronize};

    fn geometry() -> Geometry {
        Geometry::new([
            ArrayUnit::new(Point3::ORIGIN),
            ArrayUnit::new(Point3::new(200.0, 0.0, 0.0)),
        ])
    }

    #[test]
    fn routes_by_key() {
        let g = geometry();
        let group = Group::new(|dev: &Device| Some(dev.idx()))
            .set(0, Clear::new())
            .unwrap()
            .set(1, Synchronize::new())
            .unwrap();
        let cmd = group.produce(&g).unwrap();
        assert_eq!(cmd.device_ops()[0], vec![Op::Clear]);
        assert_eq!(cmd.device_ops()[1], vec![Op::Synchronize]);
    }

    #[test]
    fn none_key_excludes_device() {
        let g = geometry();
        let group = Group::new(|dev: &Device| (dev.idx() == 1).then_some("only"))
            .set("only", Clear::new())
            .unwrap();
        let cmd = group.produce(&g).unwrap();
        assert!(cmd.device_ops()[0].is_empty());
        assert_eq!(cmd.device_ops()[1], vec![Op::Clear]);
    }

    #[test]
    fn unknown_key_fails() {
        let g = geometry();
        let group = Group::new(|dev: &Device| Some(dev.idx())).set(0, Clear::new()).unwrap();
        assert!(matches!(group.produce(&g), Err(Error::UnknownGroupKey)));
    }

    #[test]
    fn duplicate_key_rejected() {
        let result = Group::new(|_: &Device| Some("a"))
            .set("a", Clear::new())
            .unwrap()
            .set("a", Synchronize::new());
        assert!(matches!(result, Err(Error::KeyAlreadyExists)));
    }

    #[test]
    fn disabled_device_never_classified() {
        let mut g = geometry();
        g.get_mut(0).unwrap().set_enable(false);
        let group = Group::new(|dev: &Device| {
            assert_ne!(dev.idx(), 0, "key map must not see disabled devices");
            Some("all")
        })
        .set("all", Clear::new())
        .unwrap();
        let cmd = group.produce(&g).unwrap();
        assert!(cmd.device_ops()[0].is_empty());
        assert_eq!(cmd.device_ops()[1], vec![Op::Clear]);
    }

    #[test]
    fn set_boxed_arity_checked() {
        use crate::datagram::DatagramExt;
        let group = Group::new(|_: &Device| Some("a"));
        let result = group.set_boxed("a", vec![]);
        assert!(matches!(result, Err(Error::InvalidDatagramType)));

        let group = Group::new(|_: &Device| Some("a"));
        let result = group.set_boxed(
            "a",
            vec![Clear::new().boxed(), Synchronize::new().boxed(), Clear::new().boxed()],
        );
        assert!(matches!(result, Err(Error::InvalidDatagramType)));

        let g = geometry();
        let group = Group::new(|_: &Device| Some("a"))
            .set_boxed("a", vec![Clear::new().boxed(), Synchronize::new().boxed()])
            .unwrap();
        let cmd = group.produce(&g).unwrap();
        assert_eq!(cmd.device_ops()[0], vec![Op::Clear, Op::Synchronize]);
    }

    #[test]
    fn shared_key_produces_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counting(std::sync::Arc<AtomicUsize>);

        impl Datagram for Counting {
            fn produce(&self, geometry: &Geometry) -> Result<Command> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Command::broadcast(geometry, Op::Clear))
            }
        }

        let g = geometry();
        let count = std::sync::Arc::new(AtomicUsize::new(0));
        let group = Group::new(|_: &Device| Some("shared"))
            .set("shared", Counting(count.clone()))
            .unwrap();
        let cmd = group.produce(&g).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cmd.device_ops()[0], vec![Op::Clear]);
        assert_eq!(cmd.device_ops()[1], vec![Op::Clear]);
    }
}
