//! FIR filter decorator.

use tactus_core::sampling::SamplingConfig;

use crate::Modulation;

/// Convolves the inner modulation's buffer with FIR coefficients.
///
/// The convolution is cyclic (the buffer is a repeating envelope) and
/// centered on the middle coefficient.
pub struct Fir<M> {
    inner: M,
    coef: Vec<f32>,
}

impl<M: Modulation> Fir<M> {
    /// Wrap `inner` with an FIR filter.
    pub fn new(inner: M, coef: impl IntoIterator<Item = f32>) -> Self {
        Fir {
            inner,
            coef: coef.into_iter().collect(),
        }
    }
}

impl<M: Modulation> Modulation for Fir<M> {
    fn sampling_config(&self) -> SamplingConfig {
        self.inner.sampling_config()
    }

    fn calc(&self) -> tactus_core::Result<Vec<u8>> {
        let buf = self.inner.calc()?;
        if self.coef.is_empty() {
            return Ok(buf);
        }
        let n = buf.len() as isize;
        let mid = (self.coef.len() / 2) as isize;
        Ok((0..n)
            .map(|i| {
                let acc: f32 = self
                    .coef
                    .iter()
                    .enumerate()
                    .map(|(j, c)| {
                        let idx = (i + j as isize - mid).rem_euclid(n) as usize;
                        c * f32::from(buf[idx])
                    })
                    .sum();
                acc.round().clamp(0.0, 255.0) as u8
            })
            .collect())
    }
}

impl_modulation_datagram!([M: Modulation] Fir<M>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Custom, ModulationExt};

    #[test]
    fn identity_kernel_is_noop() {
        let m = Custom::new(vec![10, 200, 30, 40], SamplingConfig::FREQ_4K).with_fir([1.0]);
        assert_eq!(m.calc().unwrap(), vec![10, 200, 30, 40]);
    }

    #[test]
    fn moving_average_smooths_cyclically() {
        let third = 1.0 / 3.0;
        let m = Custom::new(vec![0, 90, 0, 0], SamplingConfig::FREQ_4K)
            .with_fir([third, third, third]);
        // Cyclic neighborhood averages: [30, 30, 30, 0].
        assert_eq!(m.calc().unwrap(), vec![30, 30, 30, 0]);
    }

    #[test]
    fn empty_kernel_passes_through() {
        let m = Custom::new(vec![1, 2, 3], SamplingConfig::FREQ_4K).with_fir([]);
        assert_eq!(m.calc().unwrap(), vec![1, 2, 3]);
    }
}
