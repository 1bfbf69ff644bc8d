//! Additive per-transducer phase correction.
//!
//! Compensates per-transducer manufacturing phase offsets. The correction
//! table is computed lazily, once per device, and kept in a single
//! mutex-guarded cache shared across all devices -- coarse-grained on
//! purpose, these tables are computed once and reused for the lifetime of
//! the datagram.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::command::{Command, Op};
use crate::datagram::Datagram;
use crate::error::Result;
use crate::geometry::{Device, Geometry, Transducer};
use crate::types::Phase;

/// Per-transducer additive phase correction from a caller function.
pub struct PhaseCorrection<F> {
    f: F,
    cache: Mutex<HashMap<usize, Vec<Phase>>>,
}

impl<F: Fn(&Device, &Transducer) -> Phase> PhaseCorrection<F> {
    /// Create a phase correction from a per-transducer function.
    pub fn new(f: F) -> Self {
        PhaseCorrection {
            f,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn table_for(&self, dev: &Device) -> Vec<Phase> {
        let mut cache = self.cache.lock();
        cache
            .entry(dev.idx())
            .or_insert_with(|| dev.iter().map(|tr| (self.f)(dev, tr)).collect())
            .clone()
    }
}

impl<F: Fn(&Device, &Transducer) -> Phase + Send + Sync> Datagram for PhaseCorrection<F> {
    fn produce(&self, geometry: &Geometry) -> Result<Command> {
        Ok(Command::per_device(geometry, |dev| {
            Op::PhaseCorrection(self.table_for(dev))
        }))
    }
}
