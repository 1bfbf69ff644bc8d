//! The `Link` trait -- the transport boundary.
//!
//! A [`Link`] carries compiled commands to the device firmware. The core
//! treats it as opaque: it hands over a [`TxFrame`] and receives success or
//! a structured failure. Physical transports (fieldbus drivers, network
//! bridges) live outside this crate; `tactus-test-harness` provides a
//! `MockLink` with a faithful firmware model for deterministic testing,
//! and [`NopLink`] discards everything.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::Op;
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::types::Segment;

/// One dispatch-ready transmission: per-device operations plus resolved
/// send options.
#[derive(Debug, Clone, PartialEq)]
pub struct TxFrame {
    /// Operation lists indexed by device index. Empty lists are no-ops.
    pub device_ops: Vec<Vec<Op>>,
    /// Acknowledgment timeout; `None` means the device default applies.
    pub timeout: Option<Duration>,
    /// Advisory parallel-encoding threshold.
    pub parallel_threshold: usize,
    /// Advisory pacing between outgoing frames.
    pub send_interval: Duration,
    /// Advisory pacing between acknowledgment polls.
    pub receive_interval: Duration,
}

/// Firmware version report for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// Device index.
    pub idx: usize,
    /// CPU firmware version string.
    pub cpu: String,
    /// FPGA firmware version string.
    pub fpga: String,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: CPU = {}, FPGA = {}", self.idx, self.cpu, self.fpga)
    }
}

/// FPGA state snapshot for one device, as reported when state reading is
/// enabled via [`ReadsFpgaState`](crate::ReadsFpgaState).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpgaState {
    /// Whether the thermal sensor is asserted.
    pub thermal_assert: bool,
    /// Currently active gain segment.
    pub gain_segment: Segment,
    /// Currently active modulation segment.
    pub modulation_segment: Segment,
}

/// Asynchronous transport to the device firmware.
///
/// Errors surfaced by a link propagate unchanged through
/// [`Controller::send`](crate::Controller::send). Timeouts are advisory
/// hints for the transport; this layer performs no client-side
/// cancellation.
#[async_trait]
pub trait Link: Send {
    /// Open the transport for the given geometry.
    async fn open(&mut self, geometry: &Geometry) -> Result<()>;

    /// Transmit one frame and wait for the device acknowledgment.
    async fn send(&mut self, frame: TxFrame) -> Result<()>;

    /// Close the transport. Subsequent sends fail with
    /// [`Error::LinkClosed`].
    async fn close(&mut self) -> Result<()>;

    /// Whether the transport is currently open.
    fn is_open(&self) -> bool;

    /// Query per-device firmware versions.
    async fn firmware_version(&mut self) -> Result<Vec<FirmwareVersion>> {
        Err(Error::Unsupported(
            "firmware version query not supported".into(),
        ))
    }

    /// Query per-device FPGA state. Devices without state reporting
    /// enabled report `None`.
    async fn fpga_state(&mut self) -> Result<Vec<Option<FpgaState>>> {
        Err(Error::Unsupported("FPGA state query not supported".into()))
    }
}

/// A link that accepts and discards everything.
#[derive(Debug, Default)]
pub struct NopLink {
    open: bool,
}

impl NopLink {
    /// Create a closed nop link.
    pub fn new() -> Self {
        NopLink { open: false }
    }
}

#[async_trait]
impl Link for NopLink {
    async fn open(&mut self, _geometry: &Geometry) -> Result<()> {
        self.open = true;
        Ok(())
    }

    async fn send(&mut self, _frame: TxFrame) -> Result<()> {
        if !self.open {
            return Err(Error::LinkClosed);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ArrayUnit, Point3};

    #[tokio::test]
    async fn nop_link_lifecycle() {
        let g = Geometry::new([ArrayUnit::new(Point3::ORIGIN)]);
        let mut link = NopLink::new();
        assert!(!link.is_open());
        link.open(&g).await.unwrap();
        assert!(link.is_open());

        let frame = TxFrame {
            device_ops: vec![vec![]],
            timeout: None,
            parallel_threshold: 4,
            send_interval: Duration::from_millis(1),
            receive_interval: Duration::from_millis(1),
        };
        link.send(frame.clone()).await.unwrap();

        link.close().await.unwrap();
        assert!(!link.is_open());
        assert!(matches!(link.send(frame).await, Err(Error::LinkClosed)));
    }

    #[tokio::test]
    async fn nop_link_queries_unsupported() {
        let mut link = NopLink::new();
        assert!(matches!(
            link.firmware_version().await,
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(link.fpga_state().await, Err(Error::Unsupported(_))));
    }
}
