//! tactus-core: traits, command model, and geometry for the tactus
//! phased-array controller.
//!
//! This crate defines the device-agnostic abstractions the rest of the
//! workspace builds on. Applications usually depend on the `tactus` facade
//! crate instead.
//!
//! # Key types
//!
//! - [`Datagram`] -- the polymorphic command abstraction
//! - [`Command`] / [`Op`] -- the compiled command model
//! - [`Controller`] -- geometry ownership and dispatch
//! - [`Link`] -- the transport boundary
//! - [`Geometry`] / [`Device`] / [`Transducer`] -- array geometry
//! - [`Error`] / [`Result`] -- error handling

pub mod command;
pub mod controller;
pub mod datagram;
pub mod error;
pub mod geometry;
pub mod group;
pub mod link;
pub mod output_mask;
pub mod phase_correction;
pub mod sampling;
pub mod segment;
pub mod silencer;
pub mod timeout;
pub mod types;
pub mod utilities;

// Re-export key types at the crate root for ergonomic `use tactus_core::*`.
pub use command::{
    Command, ControlPoint, ControlPoints, GainStmMode, MAX_FOCI_PER_SAMPLE, Op, SilencerOp,
    TimeoutOverride,
};
pub use controller::{Controller, ControllerOptions};
pub use datagram::{Datagram, DatagramExt, DatagramL, DatagramS};
pub use error::{Error, Result};
pub use geometry::{
    ArrayUnit, DEFAULT_SOUND_SPEED, Device, Geometry, Point3, Quaternion, TRANSDUCER_PITCH_MM,
    Transducer, UNIT_SIDE, UNIT_TRANSDUCERS,
};
pub use group::Group;
pub use link::{FirmwareVersion, FpgaState, Link, NopLink, TxFrame};
pub use output_mask::OutputMask;
pub use phase_correction::PhaseCorrection;
pub use sampling::{BASE_FREQ_HZ, BASE_PERIOD_NS, SamplingConfig};
pub use segment::{
    LoopExt, SegmentExt, SwapSegment, WithFiniteLoop, WithLoopBehavior, WithSegment,
};
pub use silencer::{FixedCompletionTime, FixedUpdateRate, HasSamplingConfig, Silencer};
pub use timeout::{SendOptionExt, WithParallelThreshold, WithTimeout};
pub use types::{
    Drive, FiniteTransitionMode, GpioIn, Intensity, LoopBehavior, Phase, Segment, TransitionMode,
};
pub use utilities::{Clear, ForceFan, ReadsFpgaState, Synchronize};
