//! Per-device firmware state model.
//!
//! [`FpgaEmulator`] mirrors the double-buffered segment state one device's
//! FPGA holds for each subsystem (modulation, gain, foci-STM, gain-STM),
//! plus the silencer, flags, and correction tables. It applies [`Op`]s
//! with the same rules the hardware enforces: writing a staging segment
//! never disturbs the active one, a transition other than `Later` flips
//! the active segment, and strict-mode silencer settings reject content
//! sampled faster than the silencer can settle.

use std::time::Duration;

use tactus_core::command::{ControlPoints, GainStmMode, Op, SilencerOp};
use tactus_core::error::{Error, Result};
use tactus_core::sampling::{BASE_PERIOD_NS, SamplingConfig};
use tactus_core::types::{Drive, LoopBehavior, Phase, Segment, TransitionMode};

fn settle_ticks(time: Duration) -> u128 {
    time.as_nanos().div_ceil(u128::from(BASE_PERIOD_NS))
}

/// Double-buffered content of one subsystem.
#[derive(Debug, Clone)]
struct Buffered<T> {
    active: Segment,
    slots: [T; 2],
    configs: [SamplingConfig; 2],
    loops: [LoopBehavior; 2],
    transition: Option<TransitionMode>,
}

impl<T: Clone> Buffered<T> {
    fn new(initial: T) -> Self {
        Buffered {
            active: Segment::S0,
            slots: [initial.clone(), initial],
            configs: [SamplingConfig::FREQ_4K; 2],
            loops: [LoopBehavior::Infinite; 2],
            transition: None,
        }
    }

    fn write(
        &mut self,
        segment: Segment,
        transition: TransitionMode,
        content: T,
        config: SamplingConfig,
        loop_behavior: LoopBehavior,
    ) {
        self.slots[segment.index()] = content;
        self.configs[segment.index()] = config;
        self.loops[segment.index()] = loop_behavior;
        if transition != TransitionMode::Later {
            self.active = segment;
            self.transition = Some(transition);
        }
    }

    fn swap(&mut self, segment: Segment, transition: TransitionMode) {
        self.active = segment;
        self.transition = Some(transition);
    }
}

/// Emulated firmware state of a single device.
#[derive(Debug, Clone)]
pub struct FpgaEmulator {
    num_transducers: usize,
    modulation: Buffered<Vec<u8>>,
    gain: Buffered<Vec<Drive>>,
    foci_stm: Buffered<Vec<ControlPoints>>,
    gain_stm: Buffered<Vec<Vec<Drive>>>,
    gain_stm_modes: [GainStmMode; 2],
    silencer: SilencerOp,
    synchronized: bool,
    force_fan: bool,
    reads_fpga_state: bool,
    phase_correction: Vec<Phase>,
    output_masks: [Vec<bool>; 2],
    thermal_assert: bool,
}

impl FpgaEmulator {
    /// Create the power-on state for a device with `num_transducers`
    /// transducers.
    pub fn new(num_transducers: usize) -> Self {
        FpgaEmulator {
            num_transducers,
            modulation: Buffered::new(vec![0xFF; 2]),
            gain: Buffered::new(vec![Drive::NULL; num_transducers]),
            foci_stm: Buffered::new(Vec::new()),
            gain_stm: Buffered::new(Vec::new()),
            gain_stm_modes: [GainStmMode::default(); 2],
            silencer: SilencerOp::default(),
            synchronized: false,
            force_fan: false,
            reads_fpga_state: false,
            phase_correction: vec![Phase::ZERO; num_transducers],
            output_masks: [vec![true; num_transducers], vec![true; num_transducers]],
            thermal_assert: false,
        }
    }

    /// Check whether `op` would be accepted, without applying it.
    pub fn validate(&self, op: &Op) -> Result<()> {
        match op {
            Op::WriteGain { drives, .. } => {
                if drives.len() != self.num_transducers {
                    return Err(Error::Driver(format!(
                        "drive table has {} entries, the device has {} transducers",
                        drives.len(),
                        self.num_transducers
                    )));
                }
            }
            Op::WriteModulation { config, buffer, .. } => {
                if buffer.len() < 2 {
                    return Err(Error::Driver(
                        "modulation buffer must contain at least 2 samples".into(),
                    ));
                }
                self.check_silencer(*config, false)?;
            }
            Op::WriteFociStm { config, pattern, .. } => {
                if pattern.is_empty() {
                    return Err(Error::Driver("STM pattern must not be empty".into()));
                }
                self.check_silencer(*config, true)?;
            }
            Op::WriteGainStm {
                config, pattern, ..
            } => {
                if pattern.is_empty() {
                    return Err(Error::Driver("STM pattern must not be empty".into()));
                }
                if pattern.iter().any(|t| t.len() != self.num_transducers) {
                    return Err(Error::Driver(format!(
                        "gain STM drive tables must have {} entries",
                        self.num_transducers
                    )));
                }
                self.check_silencer(*config, true)?;
            }
            Op::PhaseCorrection(table) => {
                if table.len() != self.num_transducers {
                    return Err(Error::Driver(format!(
                        "phase correction table has {} entries, the device has {} transducers",
                        table.len(),
                        self.num_transducers
                    )));
                }
            }
            Op::OutputMask { mask, .. } => {
                if mask.len() != self.num_transducers {
                    return Err(Error::Driver(format!(
                        "output mask has {} entries, the device has {} transducers",
                        mask.len(),
                        self.num_transducers
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Apply a validated operation.
    pub fn apply(&mut self, op: &Op) {
        match op {
            Op::WriteGain {
                segment,
                transition,
                drives,
            } => {
                // Gain has no sampling config or loop; reuse the slot
                // mechanics with placeholder values.
                self.gain.write(
                    *segment,
                    *transition,
                    drives.clone(),
                    SamplingConfig::FREQ_40K,
                    LoopBehavior::Infinite,
                );
            }
            Op::WriteModulation {
                segment,
                transition,
                config,
                loop_behavior,
                buffer,
            } => {
                self.modulation
                    .write(*segment, *transition, buffer.clone(), *config, *loop_behavior);
            }
            Op::WriteFociStm {
                segment,
                transition,
                config,
                loop_behavior,
                pattern,
            } => {
                self.foci_stm
                    .write(*segment, *transition, pattern.clone(), *config, *loop_behavior);
            }
            Op::WriteGainStm {
                segment,
                transition,
                config,
                loop_behavior,
                mode,
                pattern,
            } => {
                self.gain_stm_modes[segment.index()] = *mode;
                self.gain_stm
                    .write(*segment, *transition, pattern.clone(), *config, *loop_behavior);
            }
            Op::SwapGainSegment(segment) => {
                self.gain.swap(*segment, TransitionMode::Immediate);
            }
            Op::SwapModulationSegment(segment, transition) => {
                self.modulation.swap(*segment, *transition);
            }
            Op::SwapFociStmSegment(segment, transition) => {
                self.foci_stm.swap(*segment, *transition);
            }
            Op::SwapGainStmSegment(segment, transition) => {
                self.gain_stm.swap(*segment, *transition);
            }
            Op::ConfigSilencer(config) => {
                self.silencer = *config;
            }
            Op::Clear => {
                *self = FpgaEmulator {
                    synchronized: self.synchronized,
                    thermal_assert: self.thermal_assert,
                    ..FpgaEmulator::new(self.num_transducers)
                };
            }
            Op::Synchronize => {
                self.synchronized = true;
            }
            Op::ForceFan(on) => {
                self.force_fan = *on;
            }
            Op::ReadsFpgaState(on) => {
                self.reads_fpga_state = *on;
            }
            Op::PhaseCorrection(table) => {
                self.phase_correction = table.clone();
            }
            Op::OutputMask { segment, mask } => {
                self.output_masks[segment.index()] = mask.clone();
            }
        }
    }

    fn check_silencer(&self, config: SamplingConfig, check_phase: bool) -> Result<()> {
        if let SilencerOp::CompletionTime {
            intensity,
            phase,
            strict: true,
        } = self.silencer
        {
            let division = u128::from(config.division());
            if settle_ticks(intensity) > division {
                return Err(Error::Driver(format!(
                    "silencer intensity settling time {intensity:?} exceeds the sampling period"
                )));
            }
            if check_phase && settle_ticks(phase) > division {
                return Err(Error::Driver(format!(
                    "silencer phase settling time {phase:?} exceeds the sampling period"
                )));
            }
        }
        Ok(())
    }

    /// Number of transducers of the emulated device.
    pub fn num_transducers(&self) -> usize {
        self.num_transducers
    }

    /// The drive table staged in a gain segment.
    pub fn drives(&self, segment: Segment) -> &[Drive] {
        &self.gain.slots[segment.index()]
    }

    /// The currently active gain segment.
    pub fn gain_segment(&self) -> Segment {
        self.gain.active
    }

    /// The sample buffer staged in a modulation segment.
    pub fn modulation(&self, segment: Segment) -> &[u8] {
        &self.modulation.slots[segment.index()]
    }

    /// The sampling division of a modulation segment.
    pub fn modulation_division(&self, segment: Segment) -> u16 {
        self.modulation.configs[segment.index()].division()
    }

    /// The loop behavior of a modulation segment.
    pub fn modulation_loop(&self, segment: Segment) -> LoopBehavior {
        self.modulation.loops[segment.index()]
    }

    /// The currently active modulation segment.
    pub fn modulation_segment(&self) -> Segment {
        self.modulation.active
    }

    /// The last transition mode that flipped the modulation segment.
    pub fn modulation_transition(&self) -> Option<TransitionMode> {
        self.modulation.transition
    }

    /// The foci pattern staged in a foci-STM segment.
    pub fn foci_stm(&self, segment: Segment) -> &[ControlPoints] {
        &self.foci_stm.slots[segment.index()]
    }

    /// The number of samples staged in a foci-STM segment.
    pub fn foci_stm_cycle(&self, segment: Segment) -> usize {
        self.foci_stm.slots[segment.index()].len()
    }

    /// The sampling division of a foci-STM segment.
    pub fn foci_stm_division(&self, segment: Segment) -> u16 {
        self.foci_stm.configs[segment.index()].division()
    }

    /// The loop behavior of a foci-STM segment.
    pub fn foci_stm_loop(&self, segment: Segment) -> LoopBehavior {
        self.foci_stm.loops[segment.index()]
    }

    /// The currently active foci-STM segment.
    pub fn foci_stm_segment(&self) -> Segment {
        self.foci_stm.active
    }

    /// The last transition mode that flipped the foci-STM segment.
    pub fn foci_stm_transition(&self) -> Option<TransitionMode> {
        self.foci_stm.transition
    }

    /// The gain sequence staged in a gain-STM segment.
    pub fn gain_stm(&self, segment: Segment) -> &[Vec<Drive>] {
        &self.gain_stm.slots[segment.index()]
    }

    /// The encoding mode of a gain-STM segment.
    pub fn gain_stm_mode(&self, segment: Segment) -> GainStmMode {
        self.gain_stm_modes[segment.index()]
    }

    /// The currently active gain-STM segment.
    pub fn gain_stm_segment(&self) -> Segment {
        self.gain_stm.active
    }

    /// The current silencer configuration.
    pub fn silencer(&self) -> SilencerOp {
        self.silencer
    }

    /// Whether the device clock has been synchronized.
    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Whether the cooling fan is forced on.
    pub fn is_force_fan(&self) -> bool {
        self.force_fan
    }

    /// Whether FPGA state reporting is enabled.
    pub fn reads_fpga_state(&self) -> bool {
        self.reads_fpga_state
    }

    /// The phase correction table.
    pub fn phase_correction(&self) -> &[Phase] {
        &self.phase_correction
    }

    /// The output mask of a gain segment.
    pub fn output_mask(&self, segment: Segment) -> &[bool] {
        &self.output_masks[segment.index()]
    }

    /// Whether the thermal sensor is asserted.
    pub fn thermal_assert(&self) -> bool {
        self.thermal_assert
    }

    /// Assert or deassert the thermal sensor (test control).
    pub fn set_thermal_assert(&mut self, on: bool) {
        self.thermal_assert = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn write_mod(segment: Segment, transition: TransitionMode, buffer: Vec<u8>) -> Op {
        Op::WriteModulation {
            segment,
            transition,
            config: SamplingConfig::FREQ_4K,
            loop_behavior: LoopBehavior::Infinite,
            buffer,
        }
    }

    #[test]
    fn staging_write_leaves_active_untouched() {
        let mut fpga = FpgaEmulator::new(4);
        fpga.apply(&write_mod(
            Segment::S0,
            TransitionMode::Immediate,
            vec![1, 2],
        ));
        assert_eq!(fpga.modulation_segment(), Segment::S0);

        fpga.apply(&write_mod(Segment::S1, TransitionMode::Later, vec![3, 4]));
        assert_eq!(fpga.modulation_segment(), Segment::S0, "no flip on Later");
        assert_eq!(fpga.modulation(Segment::S0), &[1, 2]);
        assert_eq!(fpga.modulation(Segment::S1), &[3, 4]);
    }

    #[test]
    fn transition_flips_active() {
        let mut fpga = FpgaEmulator::new(4);
        fpga.apply(&write_mod(Segment::S1, TransitionMode::SyncIdx, vec![9, 9]));
        assert_eq!(fpga.modulation_segment(), Segment::S1);
        assert_eq!(fpga.modulation_transition(), Some(TransitionMode::SyncIdx));
    }

    #[test]
    fn swap_flips_without_content_write() {
        let mut fpga = FpgaEmulator::new(4);
        fpga.apply(&write_mod(Segment::S1, TransitionMode::Later, vec![5, 6]));
        fpga.apply(&Op::SwapModulationSegment(
            Segment::S1,
            TransitionMode::Immediate,
        ));
        assert_eq!(fpga.modulation_segment(), Segment::S1);
        assert_eq!(fpga.modulation(Segment::S1), &[5, 6]);
    }

    #[test]
    fn strict_silencer_rejects_fast_sampling() {
        let fpga = FpgaEmulator::new(4);
        // Default silencer: 250 µs intensity settle = 10 ticks; 40 kHz
        // modulation sampling has division 1.
        let op = Op::WriteModulation {
            segment: Segment::S0,
            transition: TransitionMode::Immediate,
            config: SamplingConfig::FREQ_40K,
            loop_behavior: LoopBehavior::Infinite,
            buffer: vec![0, 1],
        };
        assert!(matches!(fpga.validate(&op), Err(Error::Driver(_))));
    }

    #[test]
    fn lenient_silencer_accepts_fast_sampling() {
        let mut fpga = FpgaEmulator::new(4);
        fpga.apply(&Op::ConfigSilencer(SilencerOp::CompletionTime {
            intensity: Duration::from_micros(250),
            phase: Duration::from_micros(1000),
            strict: false,
        }));
        let op = Op::WriteModulation {
            segment: Segment::S0,
            transition: TransitionMode::Immediate,
            config: SamplingConfig::FREQ_40K,
            loop_behavior: LoopBehavior::Infinite,
            buffer: vec![0, 1],
        };
        assert!(fpga.validate(&op).is_ok());
    }

    #[test]
    fn clear_resets_but_keeps_sync() {
        let mut fpga = FpgaEmulator::new(4);
        fpga.apply(&Op::Synchronize);
        fpga.apply(&write_mod(Segment::S1, TransitionMode::Immediate, vec![7, 8]));
        fpga.apply(&Op::ForceFan(true));
        fpga.apply(&Op::Clear);
        assert!(fpga.is_synchronized());
        assert!(!fpga.is_force_fan());
        assert_eq!(fpga.modulation_segment(), Segment::S0);
        assert_eq!(fpga.modulation(Segment::S1), &[0xFF, 0xFF]);
    }

    #[test]
    fn gain_write_validates_table_length() {
        let fpga = FpgaEmulator::new(4);
        let op = Op::WriteGain {
            segment: Segment::S0,
            transition: TransitionMode::Immediate,
            drives: vec![Drive::NULL; 3],
        };
        assert!(matches!(fpga.validate(&op), Err(Error::Driver(_))));
    }
}
