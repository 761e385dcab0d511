use std::{sync::Arc, time::Instant};

use parking_lot::Mutex;

use super::{DriftModel, Observation};

#[derive(Debug, Clone)]
/// A [`DriftModel`] shared by all requests of a server.
///
/// Each [`SharedDriftModel::advance`] is applied as one unit,
/// so concurrent requests never compute elapsed time from a stale baseline.
pub struct SharedDriftModel(Arc<Mutex<DriftModel>>);

impl Default for SharedDriftModel {
    fn default() -> Self {
        Self::new(DriftModel::new())
    }
}

impl From<DriftModel> for SharedDriftModel {
    fn from(model: DriftModel) -> Self {
        Self::new(model)
    }
}

impl SharedDriftModel {
    pub fn new(model: DriftModel) -> Self {
        Self(Arc::new(Mutex::new(model)))
    }

    /// Advance the walk to `now`.
    ///
    /// The lock is released before returning; callers wait out the latency themselves.
    pub fn advance(&self, now: Instant) -> Observation {
        self.0.lock().advance(now)
    }

    pub fn observation(&self) -> Observation {
        self.0.lock().observation()
    }

    pub fn reset(&self) {
        self.0.lock().reset();
    }
}
