//! The controller: geometry ownership and command dispatch.
//!
//! A [`Controller`] owns the [`Geometry`] and the [`Link`], produces
//! datagrams against the current geometry, resolves the effective per-send
//! options, and dispatches the resulting frame. Two sends awaited by the
//! same caller are dispatched in program order.

use std::time::Duration;

use tracing::{debug, info};

use crate::command::TimeoutOverride;
use crate::datagram::Datagram;
use crate::error::{Error, Result};
use crate::geometry::{ArrayUnit, Geometry};
use crate::link::{FirmwareVersion, FpgaState, Link, TxFrame};
use crate::utilities::{Clear, Synchronize};

/// Controller-wide defaults for per-send configuration.
///
/// Each of these can be overridden per send with
/// [`with_timeout`](crate::SendOptionExt::with_timeout) /
/// [`with_parallel_threshold`](crate::SendOptionExt::with_parallel_threshold).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Default acknowledgment timeout.
    pub default_timeout: Duration,
    /// Default parallel-encoding threshold (number of devices).
    pub default_parallel_threshold: usize,
    /// Advisory pacing between outgoing frames.
    pub send_interval: Duration,
    /// Advisory pacing between acknowledgment polls.
    pub receive_interval: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        ControllerOptions {
            default_timeout: Duration::from_millis(20),
            default_parallel_threshold: 4,
            send_interval: Duration::from_millis(1),
            receive_interval: Duration::from_millis(1),
        }
    }
}

/// A connected phased-array controller.
///
/// Created with [`Controller::open`]; closed with [`Controller::close`]
/// (idempotent -- a second close is a no-op, and every send after close
/// fails with [`Error::LinkClosed`]).
pub struct Controller<L: Link> {
    geometry: Geometry,
    link: L,
    options: ControllerOptions,
    closed: bool,
}

impl<L: Link> Controller<L> {
    /// Open a controller over `link` for the given unit placements, with
    /// default options.
    ///
    /// Performs the initial handshake: the link is opened, then every
    /// device is cleared and clock-synchronized.
    pub async fn open(units: impl IntoIterator<Item = ArrayUnit>, link: L) -> Result<Self> {
        Self::open_with(units, link, ControllerOptions::default()).await
    }

    /// Open a controller with explicit options.
    pub async fn open_with(
        units: impl IntoIterator<Item = ArrayUnit>,
        mut link: L,
        options: ControllerOptions,
    ) -> Result<Self> {
        let geometry = Geometry::new(units);
        link.open(&geometry).await?;
        info!(devices = geometry.num_devices(), "controller opened");
        let mut controller = Controller {
            geometry,
            link,
            options,
            closed: false,
        };
        controller.send((Clear::new(), Synchronize::new())).await?;
        Ok(controller)
    }

    /// The geometry this controller drives.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Mutable access to the geometry (enable flags, sound speed,
    /// reconfiguration).
    ///
    /// Must not be called concurrently with an in-flight send on this
    /// controller.
    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    /// The underlying link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Mutable access to the underlying link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// The controller-wide send options.
    pub const fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Produce `datagram` against the current geometry and dispatch it.
    ///
    /// Accepts a single datagram or a 2-tuple (sent atomically). Fails
    /// with [`Error::LinkClosed`] after [`close`](Controller::close).
    pub async fn send(&mut self, datagram: impl Datagram) -> Result<()> {
        if self.closed {
            return Err(Error::LinkClosed);
        }
        let cmd = datagram.produce(&self.geometry)?;
        let timeout = match cmd.timeout() {
            TimeoutOverride::Unset => Some(self.options.default_timeout),
            TimeoutOverride::Disabled => None,
            TimeoutOverride::After(t) => Some(t),
        };
        let frame = TxFrame {
            timeout,
            parallel_threshold: cmd
                .parallel_threshold()
                .unwrap_or(self.options.default_parallel_threshold),
            send_interval: self.options.send_interval,
            receive_interval: self.options.receive_interval,
            device_ops: cmd.device_ops().to_vec(),
        };
        debug!(
            ops = frame.device_ops.iter().map(Vec::len).sum::<usize>(),
            timeout = ?frame.timeout,
            "dispatching frame"
        );
        self.link.send(frame).await
    }

    /// Dispatch one or two boxed datagrams.
    ///
    /// This is the dynamic-arity entry point: any other arity fails with
    /// [`Error::InvalidDatagramType`].
    pub async fn send_boxed(&mut self, mut datagrams: Vec<Box<dyn Datagram>>) -> Result<()> {
        match datagrams.len() {
            1 => {
                let d = datagrams.pop().expect("length checked");
                self.send(d).await
            }
            2 => {
                let second = datagrams.pop().expect("length checked");
                let first = datagrams.pop().expect("length checked");
                self.send((first, second)).await
            }
            _ => Err(Error::InvalidDatagramType),
        }
    }

    /// Query per-device firmware versions through the link.
    pub async fn firmware_version(&mut self) -> Result<Vec<FirmwareVersion>> {
        if self.closed {
            return Err(Error::LinkClosed);
        }
        self.link.firmware_version().await
    }

    /// Query per-device FPGA state through the link.
    ///
    /// Devices without state reporting enabled (see
    /// [`ReadsFpgaState`](crate::ReadsFpgaState)) report `None`.
    pub async fn fpga_state(&mut self) -> Result<Vec<Option<FpgaState>>> {
        if self.closed {
            return Err(Error::LinkClosed);
        }
        self.link.fpga_state().await
    }

    /// Close the controller: clear every device and shut the link down.
    ///
    /// Idempotent; a second call is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.send(Clear::new()).await?;
        self.link.close().await?;
        self.closed = true;
        info!("controller closed");
        Ok(())
    }
}

impl<L: Link> Drop for Controller<L> {
    fn drop(&mut self) {
        if !self.closed {
            debug!("controller dropped without close()");
        }
    }
}
