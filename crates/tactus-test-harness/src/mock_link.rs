//! Mock link for deterministic testing without hardware.
//!
//! [`MockLink`] implements the [`Link`] trait over a bank of
//! [`FpgaEmulator`]s, one per device. Every sent frame is validated for
//! all devices first and applied only if the whole frame is acceptable,
//! so a failed send leaves no device partially updated. Recorded state
//! (drive tables, modulation buffers, active segments, send options) is
//! exposed through accessors for assertions.

use std::time::Duration;

use async_trait::async_trait;

use tactus_core::command::{ControlPoints, SilencerOp};
use tactus_core::error::{Error, Result};
use tactus_core::geometry::Geometry;
use tactus_core::link::{FirmwareVersion, FpgaState, Link, TxFrame};
use tactus_core::types::{Drive, LoopBehavior, Phase, Segment, TransitionMode};

use crate::fpga::FpgaEmulator;

/// Firmware version string reported by the emulated devices.
pub const EMULATED_VERSION: &str = "v0.1.0";

/// A [`Link`] backed by per-device firmware emulation.
#[derive(Debug, Default)]
pub struct MockLink {
    devices: Vec<FpgaEmulator>,
    open: bool,
    down: bool,
    last_timeout: Option<Option<Duration>>,
    last_parallel_threshold: Option<usize>,
    frames_sent: usize,
}

impl MockLink {
    /// Create a closed mock link.
    pub fn new() -> Self {
        MockLink::default()
    }

    /// Simulate a transport failure: subsequent sends fail until
    /// [`up`](MockLink::up).
    pub fn down(&mut self) {
        self.down = true;
    }

    /// Restore the transport after [`down`](MockLink::down).
    pub fn up(&mut self) {
        self.down = false;
    }

    /// The emulated firmware state of one device.
    pub fn device(&self, idx: usize) -> &FpgaEmulator {
        &self.devices[idx]
    }

    /// Mutable access to one device's emulated state (test control, e.g.
    /// thermal assertion).
    pub fn device_mut(&mut self, idx: usize) -> &mut FpgaEmulator {
        &mut self.devices[idx]
    }

    /// The drive table staged in a device's gain segment.
    pub fn drives(&self, idx: usize, segment: Segment) -> &[Drive] {
        self.devices[idx].drives(segment)
    }

    /// The sample buffer staged in a device's modulation segment.
    pub fn modulation(&self, idx: usize, segment: Segment) -> &[u8] {
        self.devices[idx].modulation(segment)
    }

    /// The sampling division of a device's modulation segment.
    pub fn modulation_division(&self, idx: usize, segment: Segment) -> u16 {
        self.devices[idx].modulation_division(segment)
    }

    /// The loop behavior of a device's modulation segment.
    pub fn modulation_loop(&self, idx: usize, segment: Segment) -> LoopBehavior {
        self.devices[idx].modulation_loop(segment)
    }

    /// A device's active modulation segment.
    pub fn modulation_segment(&self, idx: usize) -> Segment {
        self.devices[idx].modulation_segment()
    }

    /// The last transition that flipped a device's modulation segment.
    pub fn modulation_transition(&self, idx: usize) -> Option<TransitionMode> {
        self.devices[idx].modulation_transition()
    }

    /// A device's active gain segment.
    pub fn gain_segment(&self, idx: usize) -> Segment {
        self.devices[idx].gain_segment()
    }

    /// The foci pattern staged in a device's foci-STM segment.
    pub fn foci_stm(&self, idx: usize, segment: Segment) -> &[ControlPoints] {
        self.devices[idx].foci_stm(segment)
    }

    /// A device's active foci-STM segment.
    pub fn foci_stm_segment(&self, idx: usize) -> Segment {
        self.devices[idx].foci_stm_segment()
    }

    /// A device's active gain-STM segment.
    pub fn gain_stm_segment(&self, idx: usize) -> Segment {
        self.devices[idx].gain_stm_segment()
    }

    /// A device's current silencer configuration.
    pub fn silencer(&self, idx: usize) -> SilencerOp {
        self.devices[idx].silencer()
    }

    /// Whether a device's fan is forced on.
    pub fn is_force_fan(&self, idx: usize) -> bool {
        self.devices[idx].is_force_fan()
    }

    /// A device's phase correction table.
    pub fn phase_correction(&self, idx: usize) -> &[Phase] {
        self.devices[idx].phase_correction()
    }

    /// The resolved timeout of the last sent frame.
    ///
    /// `None` if nothing has been sent; `Some(None)` when the last frame
    /// disabled the timeout (device default).
    pub fn last_timeout(&self) -> Option<Option<Duration>> {
        self.last_timeout
    }

    /// The parallel threshold of the last sent frame.
    pub fn last_parallel_threshold(&self) -> Option<usize> {
        self.last_parallel_threshold
    }

    /// Number of frames accepted so far.
    pub fn frames_sent(&self) -> usize {
        self.frames_sent
    }
}

#[async_trait]
impl Link for MockLink {
    async fn open(&mut self, geometry: &Geometry) -> Result<()> {
        self.devices = geometry
            .iter()
            .map(|dev| FpgaEmulator::new(dev.num_transducers()))
            .collect();
        self.open = true;
        Ok(())
    }

    async fn send(&mut self, frame: TxFrame) -> Result<()> {
        if !self.open {
            return Err(Error::LinkClosed);
        }
        if self.down {
            return Err(Error::Link("link is down".into()));
        }
        if frame.device_ops.len() != self.devices.len() {
            return Err(Error::Link(format!(
                "frame addresses {} devices, link has {}",
                frame.device_ops.len(),
                self.devices.len()
            )));
        }

        // Validate the whole frame before applying anything, so a
        // rejected send leaves every device untouched.
        for (dev, ops) in self.devices.iter().zip(&frame.device_ops) {
            for op in ops {
                dev.validate(op)?;
            }
        }
        for (dev, ops) in self.devices.iter_mut().zip(&frame.device_ops) {
            for op in ops {
                dev.apply(op);
            }
        }

        self.last_timeout = Some(frame.timeout);
        self.last_parallel_threshold = Some(frame.parallel_threshold);
        self.frames_sent += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn firmware_version(&mut self) -> Result<Vec<FirmwareVersion>> {
        Ok(self
            .devices
            .iter()
            .enumerate()
            .map(|(idx, _)| FirmwareVersion {
                idx,
                cpu: EMULATED_VERSION.into(),
                fpga: EMULATED_VERSION.into(),
            })
            .collect())
    }

    async fn fpga_state(&mut self) -> Result<Vec<Option<FpgaState>>> {
        Ok(self
            .devices
            .iter()
            .map(|dev| {
                dev.reads_fpga_state().then(|| FpgaState {
                    thermal_assert: dev.thermal_assert(),
                    gain_segment: dev.gain_segment(),
                    modulation_segment: dev.modulation_segment(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_core::command::Op;
    use tactus_core::geometry::{ArrayUnit, Point3};

    fn frame(device_ops: Vec<Vec<Op>>) -> TxFrame {
        TxFrame {
            device_ops,
            timeout: Some(Duration::from_millis(20)),
            parallel_threshold: 4,
            send_interval: Duration::from_millis(1),
            receive_interval: Duration::from_millis(1),
        }
    }

    async fn open_link(num_devices: usize) -> MockLink {
        let units =
            (0..num_devices).map(|i| ArrayUnit::new(Point3::new(200.0 * i as f32, 0.0, 0.0)));
        let geometry = Geometry::new(units);
        let mut link = MockLink::new();
        link.open(&geometry).await.unwrap();
        link
    }

    #[tokio::test]
    async fn send_records_options() {
        let mut link = open_link(1).await;
        link.send(frame(vec![vec![Op::Clear]])).await.unwrap();
        assert_eq!(link.frames_sent(), 1);
        assert_eq!(link.last_timeout(), Some(Some(Duration::from_millis(20))));
        assert_eq!(link.last_parallel_threshold(), Some(4));
    }

    #[tokio::test]
    async fn rejected_frame_applies_nothing() {
        let mut link = open_link(2).await;
        // Device 0 gets a valid clear, device 1 an invalid gain write;
        // the whole frame must be rejected atomically.
        let bad = Op::WriteGain {
            segment: Segment::S0,
            transition: TransitionMode::Immediate,
            drives: vec![Drive::NULL; 3],
        };
        let result = link
            .send(frame(vec![vec![Op::ForceFan(true)], vec![bad]]))
            .await;
        assert!(result.is_err());
        assert!(!link.is_force_fan(0), "no partial application");
        assert_eq!(link.frames_sent(), 0);
    }

    #[tokio::test]
    async fn down_link_fails_sends() {
        let mut link = open_link(1).await;
        link.down();
        let result = link.send(frame(vec![vec![Op::Clear]])).await;
        assert!(matches!(result, Err(Error::Link(_))));
        link.up();
        link.send(frame(vec![vec![Op::Clear]])).await.unwrap();
    }

    #[tokio::test]
    async fn fpga_state_respects_reads_flag() {
        let mut link = open_link(2).await;
        link.send(frame(vec![
            vec![Op::ReadsFpgaState(true)],
            vec![Op::ReadsFpgaState(false)],
        ]))
        .await
        .unwrap();
        let states = link.fpga_state().await.unwrap();
        assert!(states[0].is_some());
        assert!(states[1].is_none());
    }
}
