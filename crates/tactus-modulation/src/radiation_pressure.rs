//! Radiation-pressure remapping decorator.

use tactus_core::sampling::SamplingConfig;

use crate::Modulation;

/// Remaps amplitude samples to their radiation-pressure equivalent.
///
/// Perceived radiation pressure grows with the square of the emitted
/// amplitude, so the envelope is pre-distorted through the square-root
/// curve: `v -> sqrt(v / 255) * 255`. The mapping is monotonic and fixes
/// both endpoints.
pub struct RadiationPressure<M> {
    inner: M,
}

impl<M: Modulation> RadiationPressure<M> {
    /// Wrap `inner` with the radiation-pressure remap.
    pub fn new(inner: M) -> Self {
        RadiationPressure { inner }
    }
}

impl<M: Modulation> Modulation for RadiationPressure<M> {
    fn sampling_config(&self) -> SamplingConfig {
        self.inner.sampling_config()
    }

    fn calc(&self) -> tactus_core::Result<Vec<u8>> {
        Ok(self
            .inner
            .calc()?
            .into_iter()
            .map(|v| ((f32::from(v) / 255.0).sqrt() * 255.0).round() as u8)
            .collect())
    }
}

impl_modulation_datagram!([M: Modulation] RadiationPressure<M>);
