//! The compiled command model.
//!
//! A [`Command`] is the opaque handle a [`Datagram`](crate::Datagram)
//! produces: one operation list per device plus the cross-cutting send
//! options (timeout override, parallel threshold) collected from decorator
//! wrappers. The [`Op`] variants are the closed set of operations the
//! device firmware understands; the link consumes them behind the
//! [`Link`](crate::Link) boundary.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::geometry::{Geometry, Point3};
use crate::sampling::SamplingConfig;
use crate::types::{Drive, Intensity, LoopBehavior, Phase, Segment, TransitionMode};

/// Maximum number of simultaneous foci in one STM sample.
pub const MAX_FOCI_PER_SAMPLE: usize = 8;

/// One beamforming target within an STM sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    point: Point3,
    phase_offset: Phase,
}

impl ControlPoint {
    /// Create a control point focused at `point`.
    pub const fn new(point: Point3) -> Self {
        ControlPoint {
            point,
            phase_offset: Phase::ZERO,
        }
    }

    /// Add a phase offset to this control point.
    pub const fn with_phase_offset(mut self, phase_offset: Phase) -> Self {
        self.phase_offset = phase_offset;
        self
    }

    /// The focal position.
    pub const fn point(&self) -> Point3 {
        self.point
    }

    /// The phase offset applied on top of the focusing phase.
    pub const fn phase_offset(&self) -> Phase {
        self.phase_offset
    }
}

impl From<Point3> for ControlPoint {
    fn from(point: Point3) -> Self {
        ControlPoint::new(point)
    }
}

/// One STM sample: 1 to 8 simultaneous foci and a shared intensity.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoints {
    points: Vec<ControlPoint>,
    intensity: Intensity,
}

impl ControlPoints {
    /// Create an STM sample from its control points.
    ///
    /// The cardinality must be between 1 and [`MAX_FOCI_PER_SAMPLE`].
    pub fn new(points: Vec<ControlPoint>) -> Result<Self> {
        if points.is_empty() || points.len() > MAX_FOCI_PER_SAMPLE {
            return Err(Error::InvalidParameter(format!(
                "an STM sample must contain 1 to {MAX_FOCI_PER_SAMPLE} foci, got {}",
                points.len()
            )));
        }
        Ok(ControlPoints {
            points,
            intensity: Intensity::MAX,
        })
    }

    /// Set the emission intensity for this sample.
    pub fn with_intensity(mut self, intensity: Intensity) -> Self {
        self.intensity = intensity;
        self
    }

    /// Number of simultaneous foci in this sample.
    pub fn cardinality(&self) -> usize {
        self.points.len()
    }

    /// The control points of this sample.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// The emission intensity of this sample.
    pub const fn intensity(&self) -> Intensity {
        self.intensity
    }
}

impl From<ControlPoint> for ControlPoints {
    fn from(point: ControlPoint) -> Self {
        ControlPoints {
            points: vec![point],
            intensity: Intensity::MAX,
        }
    }
}

impl From<Point3> for ControlPoints {
    fn from(point: Point3) -> Self {
        ControlPoint::from(point).into()
    }
}

/// How a gain-STM pattern is encoded for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GainStmMode {
    /// Full phase and intensity per sample.
    #[default]
    PhaseIntensityFull,
    /// Full phase per sample; intensity fixed at maximum.
    PhaseFull,
    /// Half-resolution phase per sample; intensity fixed at maximum.
    PhaseHalf,
}

/// Transition-smoothing filter configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SilencerOp {
    /// Fixed per-tick update step sizes for intensity and phase.
    UpdateRate {
        /// Intensity update step per 25 µs tick.
        intensity: u16,
        /// Phase update step per 25 µs tick.
        phase: u16,
    },
    /// Fixed time within which a changed intensity/phase must settle.
    CompletionTime {
        /// Settling time for intensity changes.
        intensity: Duration,
        /// Settling time for phase changes.
        phase: Duration,
        /// Reject sampling configurations that change faster than the
        /// silencer can settle.
        strict: bool,
    },
}

impl Default for SilencerOp {
    fn default() -> Self {
        SilencerOp::CompletionTime {
            intensity: Duration::from_micros(250),
            phase: Duration::from_micros(1000),
            strict: true,
        }
    }
}

/// One firmware operation addressed to a single device.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Write a per-transducer drive table into a gain segment.
    WriteGain {
        /// Target segment.
        segment: Segment,
        /// Transition trigger; `Later` updates content only.
        transition: TransitionMode,
        /// One drive per transducer.
        drives: Vec<Drive>,
    },
    /// Write an amplitude-sample buffer into a modulation segment.
    WriteModulation {
        /// Target segment.
        segment: Segment,
        /// Transition trigger; `Later` updates content only.
        transition: TransitionMode,
        /// Sampling configuration of the buffer.
        config: SamplingConfig,
        /// Playback loop behavior.
        loop_behavior: LoopBehavior,
        /// Amplitude samples.
        buffer: Vec<u8>,
    },
    /// Write a foci pattern into a foci-STM segment.
    WriteFociStm {
        /// Target segment.
        segment: Segment,
        /// Transition trigger; `Later` updates content only.
        transition: TransitionMode,
        /// Sampling configuration of the pattern.
        config: SamplingConfig,
        /// Playback loop behavior.
        loop_behavior: LoopBehavior,
        /// One sample per playback step.
        pattern: Vec<ControlPoints>,
    },
    /// Write a gain sequence into a gain-STM segment.
    WriteGainStm {
        /// Target segment.
        segment: Segment,
        /// Transition trigger; `Later` updates content only.
        transition: TransitionMode,
        /// Sampling configuration of the sequence.
        config: SamplingConfig,
        /// Playback loop behavior.
        loop_behavior: LoopBehavior,
        /// Pattern encoding mode.
        mode: GainStmMode,
        /// One drive table per playback step.
        pattern: Vec<Vec<Drive>>,
    },
    /// Flip the active gain segment without writing content.
    SwapGainSegment(Segment),
    /// Flip the active modulation segment without writing content.
    SwapModulationSegment(Segment, TransitionMode),
    /// Flip the active foci-STM segment without writing content.
    SwapFociStmSegment(Segment, TransitionMode),
    /// Flip the active gain-STM segment without writing content.
    SwapGainStmSegment(Segment, TransitionMode),
    /// Configure the transition-smoothing filter.
    ConfigSilencer(SilencerOp),
    /// Reset the device to its power-on state.
    Clear,
    /// Synchronize the device clock with the host.
    Synchronize,
    /// Force the cooling fan on or off.
    ForceFan(bool),
    /// Enable or disable FPGA state reporting.
    ReadsFpgaState(bool),
    /// Additive per-transducer phase correction table.
    PhaseCorrection(Vec<Phase>),
    /// Per-transducer emission mask for a gain segment.
    OutputMask {
        /// Target segment.
        segment: Segment,
        /// One flag per transducer; `false` silences the transducer.
        mask: Vec<bool>,
    },
}

/// A per-send timeout override collected from `with_timeout` wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutOverride {
    /// No override; the controller default applies.
    #[default]
    Unset,
    /// Override explicitly disabled; the device default applies.
    Disabled,
    /// Wait up to the given duration for the device acknowledgment.
    After(Duration),
}

impl TimeoutOverride {
    /// Merge two overrides, e.g. for the two halves of a datagram tuple.
    ///
    /// `Unset` yields to anything, `Disabled` yields to an explicit
    /// duration, and two durations merge to the larger one.
    pub fn merge(self, other: TimeoutOverride) -> TimeoutOverride {
        use TimeoutOverride::{After, Disabled, Unset};
        match (self, other) {
            (Unset, o) | (o, Unset) => o,
            (Disabled, o) | (o, Disabled) => o,
            (After(a), After(b)) => After(a.max(b)),
        }
    }
}

/// A compiled, dispatch-ready command: one operation list per device.
///
/// Devices with an empty operation list (disabled devices, devices excluded
/// by group routing) are untouched by the send.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Command {
    device_ops: Vec<Vec<Op>>,
    timeout: TimeoutOverride,
    parallel_threshold: Option<usize>,
}

impl Command {
    /// Create an empty command for a geometry of `num_devices` devices.
    pub fn new(num_devices: usize) -> Self {
        Command {
            device_ops: vec![Vec::new(); num_devices],
            timeout: TimeoutOverride::Unset,
            parallel_threshold: None,
        }
    }

    /// Create a command carrying `op` for every enabled device.
    pub fn broadcast(geometry: &Geometry, op: Op) -> Self {
        let mut cmd = Command::new(geometry.num_devices());
        for dev in geometry.devices() {
            cmd.device_ops[dev.idx()].push(op.clone());
        }
        cmd
    }

    /// Create a command from one operation per enabled device.
    ///
    /// `f` is invoked for enabled devices only.
    pub fn per_device(geometry: &Geometry, mut f: impl FnMut(&crate::geometry::Device) -> Op) -> Self {
        let mut cmd = Command::new(geometry.num_devices());
        for dev in geometry.devices() {
            let op = f(dev);
            cmd.device_ops[dev.idx()].push(op);
        }
        cmd
    }

    /// Try to create a command from one operation per enabled device.
    pub fn try_per_device(
        geometry: &Geometry,
        mut f: impl FnMut(&crate::geometry::Device) -> Result<Op>,
    ) -> Result<Self> {
        let mut cmd = Command::new(geometry.num_devices());
        for dev in geometry.devices() {
            let op = f(dev)?;
            cmd.device_ops[dev.idx()].push(op);
        }
        Ok(cmd)
    }

    /// Append an operation for one device.
    pub fn push(&mut self, device: usize, op: Op) {
        self.device_ops[device].push(op);
    }

    /// The per-device operation lists, indexed by device index.
    pub fn device_ops(&self) -> &[Vec<Op>] {
        &self.device_ops
    }

    /// The collected timeout override.
    pub const fn timeout(&self) -> TimeoutOverride {
        self.timeout
    }

    /// Replace the timeout override. Re-wrapping is idempotent: the
    /// outermost wrapper wins.
    pub fn set_timeout(&mut self, timeout: TimeoutOverride) {
        self.timeout = timeout;
    }

    /// The collected parallel-threshold override, if any.
    pub const fn parallel_threshold(&self) -> Option<usize> {
        self.parallel_threshold
    }

    /// Replace the parallel-threshold override. Re-wrapping is idempotent:
    /// the outermost wrapper wins.
    pub fn set_parallel_threshold(&mut self, threshold: usize) {
        self.parallel_threshold = Some(threshold);
    }

    /// Merge another command produced against the same geometry into this
    /// one. Per-device operations are concatenated in order.
    pub fn merge(mut self, other: Command) -> Command {
        debug_assert_eq!(self.device_ops.len(), other.device_ops.len());
        for (ops, mut extra) in self.device_ops.iter_mut().zip(other.device_ops) {
            ops.append(&mut extra);
        }
        self.timeout = self.timeout.merge(other.timeout);
        self.parallel_threshold = match (self.parallel_threshold, other.parallel_threshold) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ArrayUnit;

    fn geometry() -> Geometry {
        Geometry::new([
            ArrayUnit::new(Point3::ORIGIN),
            ArrayUnit::new(Point3::new(200.0, 0.0, 0.0)),
        ])
    }

    #[test]
    fn control_points_cardinality_limits() {
        assert!(ControlPoints::new(vec![]).is_err());
        let nine = vec![ControlPoint::new(Point3::ORIGIN); 9];
        assert!(ControlPoints::new(nine).is_err());
        let eight = vec![ControlPoint::new(Point3::ORIGIN); 8];
        assert_eq!(ControlPoints::new(eight).unwrap().cardinality(), 8);
    }

    #[test]
    fn control_points_from_point() {
        let cp: ControlPoints = Point3::new(0.0, 0.0, 150.0).into();
        assert_eq!(cp.cardinality(), 1);
        assert_eq!(cp.intensity(), Intensity::MAX);
    }

    #[test]
    fn broadcast_skips_disabled() {
        let mut g = geometry();
        g.get_mut(0).unwrap().set_enable(false);
        let cmd = Command::broadcast(&g, Op::Clear);
        assert!(cmd.device_ops()[0].is_empty());
        assert_eq!(cmd.device_ops()[1], vec![Op::Clear]);
    }

    #[test]
    fn merge_concatenates_ops() {
        let g = geometry();
        let a = Command::broadcast(&g, Op::Clear);
        let b = Command::broadcast(&g, Op::Synchronize);
        let merged = a.merge(b);
        assert_eq!(merged.device_ops()[0], vec![Op::Clear, Op::Synchronize]);
        assert_eq!(merged.device_ops()[1], vec![Op::Clear, Op::Synchronize]);
    }

    #[test]
    fn timeout_override_merge() {
        use TimeoutOverride::{After, Disabled, Unset};
        let a = Duration::from_millis(10);
        let b = Duration::from_millis(20);
        assert_eq!(Unset.merge(After(a)), After(a));
        assert_eq!(Disabled.merge(Unset), Disabled);
        assert_eq!(Disabled.merge(After(b)), After(b));
        assert_eq!(After(a).merge(After(b)), After(b));
    }

    #[test]
    fn silencer_default_is_strict_completion_time() {
        match SilencerOp::default() {
            SilencerOp::CompletionTime {
                intensity,
                phase,
                strict,
            } => {
                assert_eq!(intensity, Duration::from_micros(250));
                assert_eq!(phase, Duration::from_micros(1000));
                assert!(strict);
            }
            SilencerOp::UpdateRate { .. } => panic!("wrong default"),
        }
    }
}
