//! Utility datagrams: device housekeeping commands.
//!
//! These carry no drive content; they reset devices, synchronize clocks,
//! and toggle per-device flags.

use crate::command::{Command, Op};
use crate::datagram::Datagram;
use crate::error::Result;
use crate::geometry::{Device, Geometry};

/// Resets every enabled device to its power-on state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clear;

impl Clear {
    /// Create a clear datagram.
    pub const fn new() -> Self {
        Clear
    }
}

impl Datagram for Clear {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        Ok(Command::broadcast(geometry, Op::Clear))
    }
}

/// Synchronizes the device clocks with the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct Synchronize;

impl Synchronize {
    /// Create a synchronize datagram.
    pub const fn new() -> Self {
        Synchronize
    }
}

impl Datagram for Synchronize {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        Ok(Command::broadcast(geometry, Op::Synchronize))
    }
}

/// Forces the cooling fan on or off, decided per device.
pub struct ForceFan<F> {
    f: F,
}

impl<F: Fn(&Device) -> bool> ForceFan<F> {
    /// Create a force-fan datagram from a per-device decision function.
    pub fn new(f: F) -> Self {
        ForceFan { f }
    }
}

impl<F: Fn(&Device) -> bool + Send + Sync> Datagram for ForceFan<F> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        Ok(Command::per_device(geometry, |dev| {
            Op::ForceFan((self.f)(dev))
        }))
    }
}

/// Enables or disables FPGA state reporting, decided per device.
///
/// Devices with reporting enabled answer
/// [`Controller::fpga_state`](crate::Controller::fpga_state) queries.
pub struct ReadsFpgaState<F> {
    f: F,
}

impl<F: Fn(&Device) -> bool> ReadsFpgaState<F> {
    /// Create a state-reporting datagram from a per-device decision
    /// function.
    pub fn new(f: F) -> Self {
        ReadsFpgaState { f }
    }
}

impl<F: Fn(&Device) -> bool + Send + Sync> Datagram for ReadsFpgaState<F> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        Ok(Command::per_device(geometry, |dev| {
            Op::ReadsFpgaState((self.f)(dev))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ArrayUnit, Point3};

    fn geometry() -> Geometry {
        Geometry::new([
            ArrayUnit::new(Point3::ORIGIN),
            ArrayUnit::new(Point3::new(200.0, 0.0, 0.0)),
        ])
    }

    #[test]
    fn force_fan_per_device() {
        let cmd = ForceFan::new(|dev: &Device| dev.idx() == 0)
            .produce(&geometry())
            .unwrap();
        assert_eq!(cmd.device_ops()[0], vec![Op::ForceFan(true)]);
        assert_eq!(cmd.device_ops()[1], vec![Op::ForceFan(false)]);
    }

    #[test]
    fn clear_broadcasts() {
        let mut g = geometry();
        g.get_mut(1).unwrap().set_enable(false);
        let cmd = Clear::new().produce(&g).unwrap();
        assert_eq!(cmd.device_ops()[0], vec![Op::Clear]);
        assert!(cmd.device_ops()[1].is_empty());
    }
}
