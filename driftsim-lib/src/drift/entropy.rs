use rand::{Rng, SeedableRng as _, rngs::SmallRng};

use super::MAX_LATENCY_STEP;

/// Source of the random draws consumed by a [`super::DriftModel`].
///
/// Implementations outside of tests should be uniform over the documented ranges.
pub trait DriftEntropy: Send + 'static {
    /// Unscaled latency step in seconds, within `[-MAX_LATENCY_STEP, MAX_LATENCY_STEP]`.
    fn latency_delta(&mut self) -> f64;

    /// Roll compared against the flip threshold, within `[0, 1)`.
    fn error_roll(&mut self) -> f64;
}

#[derive(Debug, Clone)]
/// [`DriftEntropy`] backed by a [`rand`] RNG.
pub struct RngEntropy<R = SmallRng> {
    rng: R,
}

impl<R> RngEntropy<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngEntropy<SmallRng> {
    pub fn from_os_rng() -> Self {
        Self::new(SmallRng::from_os_rng())
    }

    pub fn seed_from_u64(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send + 'static> DriftEntropy for RngEntropy<R> {
    fn latency_delta(&mut self) -> f64 {
        self.rng.random_range(-MAX_LATENCY_STEP..=MAX_LATENCY_STEP)
    }

    fn error_roll(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}
