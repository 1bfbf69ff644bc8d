//! # tactus -- Phased-Array Command Construction and Dispatch
//!
//! `tactus` is a client library for multi-device ultrasonic phased-array
//! controllers. A caller describes *what* the hardware should do -- apply
//! an amplitude modulation, emit a beamforming pattern, smooth
//! transitions, switch active/staging buffers -- and the library compiles
//! that intent into opaque commands dispatched over a [`Link`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use tactus::gain::Focus;
//! use tactus::modulation::Sine;
//! use tactus::{ArrayUnit, Controller, Point3, Silencer};
//! use tactus_test_harness::MockLink;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut array = Controller::open(
//!         [ArrayUnit::new(Point3::ORIGIN)],
//!         MockLink::new(),
//!     )
//!     .await?;
//!
//!     array.send(Silencer::new()).await?;
//!     array.send((
//!         Sine::new(150.0),
//!         Focus::new(Point3::new(90.0, 80.0, 150.0)),
//!     ))
//!     .await?;
//!
//!     array.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                 | Purpose                                         |
//! |-----------------------|-------------------------------------------------|
//! | `tactus-core`         | Traits ([`Datagram`], [`Link`]), command model, geometry, errors |
//! | `tactus-gain`         | Per-transducer drive patterns ([`gain`])        |
//! | `tactus-modulation`   | Amplitude envelopes ([`modulation`])            |
//! | `tactus-stm`          | Spatio-temporal modulation ([`stm`])            |
//! | `tactus-test-harness` | Mock link with firmware emulation for tests     |
//! | **`tactus`**          | This facade crate -- re-exports everything      |
//!
//! ## The `Datagram` abstraction
//!
//! Anything sendable implements [`Datagram`]: gains, modulations, STM
//! patterns, the [`Silencer`], utility commands, and [`Group`] routing.
//! Datagrams compose through wrappers:
//!
//! - [`SegmentExt::with_segment`] stages content into a double-buffer
//!   segment with a [`TransitionMode`] trigger.
//! - [`LoopExt::with_loop_behavior`] / [`LoopExt::with_finite_loop`]
//!   attach playback loop counts.
//! - [`SendOptionExt::with_timeout`] /
//!   [`SendOptionExt::with_parallel_threshold`] override per-send options.
//! - A 2-tuple of datagrams is sent atomically as one command.

pub use tactus_core::{
    ArrayUnit, BASE_FREQ_HZ, BASE_PERIOD_NS, Clear, Command, Controller, ControllerOptions,
    DEFAULT_SOUND_SPEED, Datagram, DatagramExt, DatagramL, DatagramS, Device, Drive, Error,
    FiniteTransitionMode, FirmwareVersion, FixedCompletionTime, FixedUpdateRate, ForceFan,
    FpgaState, Geometry, GpioIn, Group, HasSamplingConfig, Intensity, Link, LoopBehavior, LoopExt,
    NopLink, Op, OutputMask, Phase, PhaseCorrection, Point3, Quaternion, ReadsFpgaState, Result,
    SamplingConfig, Segment, SegmentExt, SendOptionExt, Silencer, SilencerOp, SwapSegment,
    Synchronize,
    TRANSDUCER_PITCH_MM, TimeoutOverride, Transducer, TransitionMode, TxFrame, UNIT_SIDE,
    UNIT_TRANSDUCERS, WithFiniteLoop, WithLoopBehavior, WithParallelThreshold, WithSegment,
    WithTimeout,
};

/// Per-transducer drive patterns.
pub mod gain {
    pub use tactus_gain::{
        Cache, Custom, DriveMap, Focus, Gain, GainExt, Null, Plane, Transform, Uniform,
    };
}

/// Amplitude modulation envelopes.
pub mod modulation {
    pub use tactus_modulation::{
        Cache, Custom, Fir, Modulation, ModulationExt, RadiationPressure, Sine, Square, Static,
        Transform,
    };
}

/// Spatio-temporal modulation patterns.
pub mod stm {
    pub use tactus_stm::{
        ControlPoint, ControlPoints, FociStm, GainStm, GainStmMode, MAX_FOCI_PER_SAMPLE, StmConfig,
    };
}
