//! Per-transducer emission masking.
//!
//! Silences individual transducers of a gain segment without touching the
//! staged drives. Like [`PhaseCorrection`](crate::PhaseCorrection), the
//! mask is computed lazily once per device under a single shared mutex.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::command::{Command, Op};
use crate::datagram::{Datagram, DatagramS};
use crate::error::Result;
use crate::geometry::{Device, Geometry, Transducer};
use crate::types::{Segment, TransitionMode};

/// Per-transducer emission mask from a caller function.
///
/// Transducers mapped to `false` are silenced.
pub struct OutputMask<F> {
    f: F,
    cache: Mutex<HashMap<usize, Vec<bool>>>,
}

impl<F: Fn(&Device, &Transducer) -> bool> OutputMask<F> {
    /// Create an output mask from a per-transducer function.
    pub fn new(f: F) -> Self {
        OutputMask {
            f,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn mask_for(&self, dev: &Device) -> Vec<bool> {
        let mut cache = self.cache.lock();
        cache
            .entry(dev.idx())
            .or_insert_with(|| dev.iter().map(|tr| (self.f)(dev, tr)).collect())
            .clone()
    }
}

impl<F: Fn(&Device, &Transducer) -> bool + Send + Sync> Datagram for OutputMask<F> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        self.produce_with_segment(geometry, Segment::S0, TransitionMode::Immediate)
    }
}

impl<F: Fn(&Device, &Transducer) -> bool + Send + Sync> DatagramS for OutputMask<F> {
    fn produce_with_segment(
        &self,
        geometry: &Geometry,
        segment: Segment,
        _transition: TransitionMode,
    ) -> Result<Command> {
        Ok(Command::per_device(geometry, |dev| Op::OutputMask {
            segment,
            mask: self.mask_for(dev),
        }))
    }
}
