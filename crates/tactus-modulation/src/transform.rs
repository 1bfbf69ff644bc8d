//! Sample post-processing decorator.

use tactus_core::sampling::SamplingConfig;

use crate::Modulation;

/// Post-processes every sample computed by the inner modulation.
///
/// The function receives the sample index and the original sample.
pub struct Transform<M, F> {
    inner: M,
    f: F,
}

impl<M: Modulation, F: Fn(usize, u8) -> u8> Transform<M, F> {
    /// Wrap `inner` with a per-sample transform.
    pub fn new(inner: M, f: F) -> Self {
        Transform { inner, f }
    }
}

impl<M, F> Modulation for Transform<M, F>
where
    M: Modulation,
    F: Fn(usize, u8) -> u8 + Send + Sync,
{
    fn sampling_config(&self) -> SamplingConfig {
        self.inner.sampling_config()
    }

    fn calc(&self) -> tactus_core::Result<Vec<u8>> {
        Ok(self
            .inner
            .calc()?
            .into_iter()
            .enumerate()
            .map(|(i, v)| (self.f)(i, v))
            .collect())
    }
}

impl_modulation_datagram!([M: Modulation, F: Fn(usize, u8) -> u8 + Send + Sync] Transform<M, F>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Custom, ModulationExt};

    #[test]
    fn applies_per_sample() {
        let m = Custom::new(vec![10, 20, 30], SamplingConfig::FREQ_4K)
            .with_transform(|i, v| v + i as u8);
        assert_eq!(m.calc().unwrap(), vec![10, 21, 32]);
    }
}
