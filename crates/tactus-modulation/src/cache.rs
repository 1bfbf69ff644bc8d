//! Compute-once modulation decorator.

use parking_lot::Mutex;

use tactus_core::sampling::SamplingConfig;

use crate::Modulation;

/// Caches the inner modulation's sample buffer.
///
/// The inner compute runs at most once per `Cache` instance, lazily on
/// the first produce; every later produce clones the cached buffer.
/// Invoking the inner compute a second time through the same instance is
/// a defect.
pub struct Cache<M> {
    inner: M,
    cache: Mutex<Option<Vec<u8>>>,
}

impl<M: Modulation> Cache<M> {
    /// Wrap `inner` in a compute-once cache.
    pub fn new(inner: M) -> Self {
        Cache {
            inner,
            cache: Mutex::new(None),
        }
    }

    /// The cached sample buffer, if it has been computed.
    pub fn buffer(&self) -> Option<Vec<u8>> {
        self.cache.lock().clone()
    }
}

impl<M: Modulation> Modulation for Cache<M> {
    fn sampling_config(&self) -> SamplingConfig {
        self.inner.sampling_config()
    }

    fn calc(&self) -> tactus_core::Result<Vec<u8>> {
        let mut cache = self.cache.lock();
        match &*cache {
            Some(buffer) => Ok(buffer.clone()),
            None => {
                let buffer = self.inner.calc()?;
                *cache = Some(buffer.clone());
                Ok(buffer)
            }
        }
    }
}

impl_modulation_datagram!([M: Modulation] Cache<M>);
