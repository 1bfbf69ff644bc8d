//! Gain-based spatio-temporal modulation.

use std::time::Duration;

use tactus_core::command::{Command, GainStmMode, Op};
use tactus_core::datagram::{Datagram, DatagramL, DatagramS};
use tactus_core::error::{Error, Result};
use tactus_core::geometry::Geometry;
use tactus_core::sampling::SamplingConfig;
use tactus_core::silencer::HasSamplingConfig;
use tactus_core::types::{Drive, LoopBehavior, Segment, TransitionMode};
use tactus_gain::Gain;

use crate::StmConfig;

/// A sequence of gains played back at a fixed rate.
///
/// Trades foci-STM's compact encoding for full per-transducer freedom at
/// every sample.
pub struct GainStm {
    config: StmConfig,
    gains: Vec<Box<dyn Gain>>,
    mode: GainStmMode,
}

impl GainStm {
    /// Create a gain STM from a playback rate and a gain sequence.
    pub fn new(
        config: impl Into<StmConfig>,
        gains: impl IntoIterator<Item = Box<dyn Gain>>,
    ) -> Result<Self> {
        let gains: Vec<Box<dyn Gain>> = gains.into_iter().collect();
        if gains.is_empty() {
            return Err(Error::InvalidParameter(
                "an STM pattern requires at least one sample".into(),
            ));
        }
        Ok(GainStm {
            config: config.into(),
            gains,
            mode: GainStmMode::default(),
        })
    }

    /// Set the pattern encoding mode.
    pub fn with_mode(mut self, mode: GainStmMode) -> Self {
        self.mode = mode;
        self
    }

    /// Round the playback rate to the nearest achievable one.
    ///
    /// Fails when the STM holds an explicit sampling configuration.
    pub fn into_nearest(mut self) -> Result<Self> {
        self.config = self.config.into_nearest()?;
        Ok(self)
    }

    /// Number of gains in the pattern.
    pub fn num_samples(&self) -> usize {
        self.gains.len()
    }

    /// The resolved per-sample configuration.
    pub fn sampling_config(&self) -> Result<SamplingConfig> {
        self.config.resolve(self.gains.len())
    }

    /// The resolved pattern repetition frequency in hertz.
    pub fn freq(&self) -> Result<f32> {
        Ok(self.sampling_config()?.freq() / self.gains.len() as f32)
    }

    /// The resolved pattern period.
    pub fn period(&self) -> Result<Duration> {
        Ok(self.sampling_config()?.period() * self.gains.len() as u32)
    }

    fn command(
        &self,
        geometry: &Geometry,
        segment: Segment,
        transition: TransitionMode,
        loop_behavior: LoopBehavior,
    ) -> Result<Command> {
        let config = self.sampling_config()?;
        let maps = self
            .gains
            .iter()
            .map(|g| g.calc(geometry))
            .collect::<Result<Vec<_>>>()?;
        Command::try_per_device(geometry, |dev| {
            let pattern: Vec<Vec<Drive>> = maps
                .iter()
                .map(|map| {
                    let table = map.get(dev.idx()).ok_or_else(|| {
                        Error::Driver(format!(
                            "gain produced no drive table for device {}",
                            dev.idx()
                        ))
                    })?;
                    if table.len() != dev.num_transducers() {
                        return Err(Error::Driver(format!(
                            "gain drive table for device {} has {} entries, expected {}",
                            dev.idx(),
                            table.len(),
                            dev.num_transducers()
                        )));
                    }
                    Ok(table.to_vec())
                })
                .collect::<Result<_>>()?;
            Ok(Op::WriteGainStm {
                segment,
                transition,
                config,
                loop_behavior,
                mode: self.mode,
                pattern,
            })
        })
    }
}

impl Datagram for GainStm {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        self.command(
            geometry,
            Segment::S0,
            TransitionMode::Immediate,
            LoopBehavior::Infinite,
        )
    }
}

impl DatagramS for GainStm {
    fn produce_with_segment(
        &self,
        geometry: &Geometry,
        segment: Segment,
        transition: TransitionMode,
    ) -> Result<Command> {
        self.command(geometry, segment, transition, LoopBehavior::Infinite)
    }
}

impl DatagramL for GainStm {
    fn produce_with_loop(
        &self,
        geometry: &Geometry,
        segment: Segment,
        transition: TransitionMode,
        loop_behavior: LoopBehavior,
    ) -> Result<Command> {
        self.command(geometry, segment, transition, loop_behavior)
    }
}

impl HasSamplingConfig for GainStm {
    fn sampling_config_intensity(&self) -> Result<SamplingConfig> {
        self.sampling_config()
    }

    fn sampling_config_phase(&self) -> Result<SamplingConfig> {
        self.sampling_config()
    }
}
