//! tactus-test-harness: deterministic testing without hardware.
//!
//! [`MockLink`] implements the `Link` trait over per-device
//! [`FpgaEmulator`]s that model the firmware's double-buffered segment
//! state machine, silencer validity rules, and flag registers. Tests send
//! real datagrams through a real `Controller` and assert on the recorded
//! device state.

pub mod fpga;
pub mod mock_link;

pub use fpga::FpgaEmulator;
pub use mock_link::{EMULATED_VERSION, MockLink};
