//! tactus-stm: spatio-temporal modulation patterns.
//!
//! STM plays back a sequence of beamforming targets at a fixed sampling
//! rate: [`FociStm`] encodes focal points compactly, [`GainStm`] plays
//! arbitrary gain sequences. [`StmConfig`] resolves a requested frequency
//! or period against the pattern length, with exact-or-fail and
//! round-to-nearest variants.

mod config;
mod foci;
mod gain;

pub use config::StmConfig;
pub use foci::FociStm;
pub use gain::GainStm;

// The control-point payloads live in the core command model; re-exported
// here so STM users have everything in one place.
pub use tactus_core::command::{ControlPoint, ControlPoints, GainStmMode, MAX_FOCI_PER_SAMPLE};
