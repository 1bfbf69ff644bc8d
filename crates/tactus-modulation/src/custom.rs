//! Buffer-backed modulation.

use tactus_core::sampling::SamplingConfig;

use crate::Modulation;

/// Plays back a caller-provided sample buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Custom {
    buffer: Vec<u8>,
    config: SamplingConfig,
}

impl Custom {
    /// Create a modulation from raw samples and a sampling configuration.
    pub fn new(buffer: impl Into<Vec<u8>>, config: SamplingConfig) -> Self {
        Custom {
            buffer: buffer.into(),
            config,
        }
    }
}

impl Modulation for Custom {
    fn sampling_config(&self) -> SamplingConfig {
        self.config
    }

    fn calc(&self) -> tactus_core::Result<Vec<u8>> {
        Ok(self.buffer.clone())
    }
}

impl_modulation_datagram!(Custom);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_back_buffer_verbatim() {
        let m = Custom::new(vec![0, 64, 128, 255], SamplingConfig::FREQ_4K);
        assert_eq!(m.calc().unwrap(), vec![0, 64, 128, 255]);
        assert_eq!(m.sampling_config(), SamplingConfig::FREQ_4K);
    }
}
