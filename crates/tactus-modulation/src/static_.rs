//! Constant-amplitude (unmodulated) output.

use tactus_core::sampling::SamplingConfig;

use crate::Modulation;

/// No modulation: a constant amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Static {
    value: u8,
}

impl Static {
    /// Full constant amplitude.
    pub const fn new() -> Self {
        Static { value: 0xFF }
    }

    /// Constant amplitude at the given value.
    pub const fn with_value(value: u8) -> Self {
        Static { value }
    }

    /// The constant amplitude value.
    pub const fn value(&self) -> u8 {
        self.value
    }
}

impl Default for Static {
    fn default() -> Self {
        Static::new()
    }
}

impl Modulation for Static {
    fn sampling_config(&self) -> SamplingConfig {
        // The buffer is constant, so the rate is irrelevant; report the
        // slowest division like the firmware does.
        SamplingConfig::FREQ_MIN
    }

    fn calc(&self) -> tactus_core::Result<Vec<u8>> {
        Ok(vec![self.value; 2])
    }
}

impl_modulation_datagram!(Static);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_constant_pair() {
        assert_eq!(Static::new().calc().unwrap(), vec![0xFF, 0xFF]);
        assert_eq!(Static::with_value(0x80).calc().unwrap(), vec![0x80, 0x80]);
    }
}
