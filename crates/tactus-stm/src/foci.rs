//! Foci-based spatio-temporal modulation.

use std::time::Duration;

use tactus_core::command::{Command, ControlPoints, Op};
use tactus_core::datagram::{Datagram, DatagramL, DatagramS};
use tactus_core::error::{Error, Result};
use tactus_core::geometry::Geometry;
use tactus_core::sampling::SamplingConfig;
use tactus_core::silencer::HasSamplingConfig;
use tactus_core::types::{LoopBehavior, Segment, TransitionMode};

use crate::StmConfig;

/// A sequence of focal-point samples played back at a fixed rate.
///
/// Each sample carries 1 to 8 simultaneous foci; all samples of one
/// pattern must carry the same cardinality, validated at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FociStm {
    config: StmConfig,
    pattern: Vec<ControlPoints>,
}

impl FociStm {
    /// Create a foci STM from a playback rate and a focal pattern.
    ///
    /// `config` accepts a [`SamplingConfig`], a pattern frequency (`f32`
    /// Hz), or a pattern period ([`Duration`]); `foci` accepts anything
    /// convertible into [`ControlPoints`], e.g. bare
    /// [`Point3`](tactus_core::Point3) values.
    pub fn new(
        config: impl Into<StmConfig>,
        foci: impl IntoIterator<Item = impl Into<ControlPoints>>,
    ) -> Result<Self> {
        let pattern: Vec<ControlPoints> = foci.into_iter().map(Into::into).collect();
        if pattern.is_empty() {
            return Err(Error::InvalidParameter(
                "an STM pattern requires at least one sample".into(),
            ));
        }
        let cardinality = pattern[0].cardinality();
        if let Some(bad) = pattern.iter().find(|p| p.cardinality() != cardinality) {
            return Err(Error::InvalidParameter(format!(
                "all STM samples must carry the same number of foci: expected {cardinality}, got {}",
                bad.cardinality()
            )));
        }
        Ok(FociStm {
            config: config.into(),
            pattern,
        })
    }

    /// Round the playback rate to the nearest achievable one.
    ///
    /// Fails when the STM holds an explicit sampling configuration, which
    /// has no nearest variant.
    pub fn into_nearest(mut self) -> Result<Self> {
        self.config = self.config.into_nearest()?;
        Ok(self)
    }

    /// Number of samples in the pattern.
    pub fn num_samples(&self) -> usize {
        self.pattern.len()
    }

    /// The resolved per-sample configuration.
    pub fn sampling_config(&self) -> Result<SamplingConfig> {
        self.config.resolve(self.pattern.len())
    }

    /// The resolved pattern repetition frequency in hertz.
    pub fn freq(&self) -> Result<f32> {
        Ok(self.sampling_config()?.freq() / self.pattern.len() as f32)
    }

    /// The resolved pattern period.
    pub fn period(&self) -> Result<Duration> {
        Ok(self.sampling_config()?.period() * self.pattern.len() as u32)
    }

    fn command(
        &self,
        geometry: &Geometry,
        segment: Segment,
        transition: TransitionMode,
        loop_behavior: LoopBehavior,
    ) -> Result<Command> {
        let config = self.sampling_config()?;
        Ok(Command::broadcast(
            geometry,
            Op::WriteFociStm {
                segment,
                transition,
                config,
                loop_behavior,
                pattern: self.pattern.clone(),
            },
        ))
    }
}

impl Datagram for FociStm {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        self.command(
            geometry,
            Segment::S0,
            TransitionMode::Immediate,
            LoopBehavior::Infinite,
        )
    }
}

impl DatagramS for FociStm {
    fn produce_with_segment(
        &self,
        geometry: &Geometry,
        segment: Segment,
        transition: TransitionMode,
    ) -> Result<Command> {
        self.command(geometry, segment, transition, LoopBehavior::Infinite)
    }
}

impl DatagramL for FociStm {
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

impl HasSamplingConfig for FociStm {
    fn sampling_config_intensity(&self) -> Result<SamplingConfig> {
        self.sampling_config()
    }

    fn sampling_config_phase(&self) -> Result<SamplingConfig> {
        self.sampling_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactus_core::command::ControlPoint;
    use tactus_core::geometry::{ArrayUnit, Point3};

    fn circle(n: usize) -> Vec<Point3> {
        (0..n)
            .map(|i| {
                let theta = 2.0 * std::f32::consts::PI * i as f32 / n as f32;
                Point3::new(30.0 * theta.cos(), 30.0 * theta.sin(), 150.0)
            })
            .collect()
    }

    #[test]
    fn empty_pattern_rejected() {
        let result = FociStm::new(1.0_f32, Vec::<Point3>::new());
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn mismatched_cardinality_rejected() {
        let one = ControlPoints::new(vec![ControlPoint::new(Point3::ORIGIN)]).unwrap();
        let two = ControlPoints::new(vec![
            ControlPoint::new(Point3::ORIGIN),
            ControlPoint::new(Point3::new(1.0, 0.0, 0.0)),
        ])
        .unwrap();
        let result = FociStm::new(1.0_f32, vec![one, two]);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn freq_resolution_round_trip() {
        // 4 samples at 1 kHz pattern rate -> 4 kHz sampling.
        let stm = FociStm::new(1_000.0_f32, circle(4)).unwrap();
        assert_eq!(stm.sampling_config().unwrap(), SamplingConfig::FREQ_4K);
        assert_eq!(stm.freq().unwrap(), 1_000.0);
        assert_eq!(stm.period().unwrap(), Duration::from_millis(1));
    }

    #[test]
    fn non_integral_rate_fails_until_nearest() {
        let stm = FociStm::new(1_500.0_f32, circle(4)).unwrap();
        assert!(stm.sampling_config().is_err());
        let stm = stm.into_nearest().unwrap();
        assert_eq!(stm.sampling_config().unwrap().division(), 7);
    }

    #[test]
    fn into_nearest_rejects_explicit_config() {
        let stm = FociStm::new(SamplingConfig::FREQ_4K, circle(4)).unwrap();
        assert!(stm.into_nearest().is_err());
    }

    #[test]
    fn produce_writes_pattern() {
        let g = Geometry::new([ArrayUnit::new(Point3::ORIGIN)]);
        let stm = FociStm::new(SamplingConfig::FREQ_4K, circle(8)).unwrap();
        let cmd = stm.produce(&g).unwrap();
        match &cmd.device_ops()[0][0] {
            Op::WriteFociStm {
                segment,
                pattern,
                loop_behavior,
                ..
            } => {
                assert_eq!(*segment, Segment::S0);
                assert_eq!(pattern.len(), 8);
                assert_eq!(*loop_behavior, LoopBehavior::Infinite);
            }
            other => panic!("unexpected op: {other:?}"),
        }
    }
}
