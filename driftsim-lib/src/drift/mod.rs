//! Bounded random walk over a simulated latency and error flag.
//!
//! Every observation moves the state by a random step whose magnitude
//! scales with the time elapsed since the previous observation:
//! frequent polling yields smooth drift, sparse polling yields larger jumps.

use std::time::{Duration, Instant};

mod entropy;
mod shared;


pub use self::{
    entropy::{DriftEntropy, RngEntropy},
    shared::SharedDriftModel,
};

/// Largest latency step (in seconds, either direction) prior to scaling.
pub const MAX_LATENCY_STEP: f64 = 0.1;

/// Base probability for the error flag to flip on a single observation.
pub const DEFAULT_ERROR_BIAS_RATE: f64 = 0.2;

/// Lower bound of both scale factors.
pub const MIN_SCALE: f64 = 0.1;

/// Upper bound of both scale factors.
pub const MAX_SCALE: f64 = 2.0;

const LATENCY_SCALE_PERIOD_SECS: f64 = 5.0;
const ERROR_SCALE_PERIOD_SECS: f64 = 10.0;

/// Scale applied to a latency step for the given elapsed time,
/// always within [`MIN_SCALE`, `MAX_SCALE`].
#[inline]
pub fn latency_scale(elapsed: Duration) -> f64 {
    clamp_scale(elapsed.as_secs_f64() / LATENCY_SCALE_PERIOD_SECS)
}

/// Scale applied to the error flip probability for the given elapsed time,
/// always within [`MIN_SCALE`, `MAX_SCALE`].
#[inline]
pub fn error_scale(elapsed: Duration) -> f64 {
    clamp_scale(elapsed.as_secs_f64() / ERROR_SCALE_PERIOD_SECS)
}

#[inline(always)]
fn clamp_scale(v: f64) -> f64 {
    v.clamp(MIN_SCALE, MAX_SCALE)
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Simulated health as seen by a single request.
pub struct Observation {
    pub latency: Duration,
    pub is_erroring: bool,
}

impl Observation {
    #[inline(always)]
    pub fn latency_secs(&self) -> f64 {
        self.latency.as_secs_f64()
    }
}

/// The drifting state of a simulated endpoint.
///
/// Create one per process and share it (see [`SharedDriftModel`]):
/// the walk only means something when its history carries over
/// from one request to the next.
pub struct DriftModel {
    latency: f64,
    is_erroring: bool,
    last_observed_at: Instant,
    error_bias_rate: f64,
    entropy: Box<dyn DriftEntropy>,
}

impl std::fmt::Debug for DriftModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriftModel")
            .field("latency", &self.latency)
            .field("is_erroring", &self.is_erroring)
            .field("last_observed_at", &self.last_observed_at)
            .field("error_bias_rate", &self.error_bias_rate)
            .finish_non_exhaustive()
    }
}

impl Default for DriftModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DriftModel {
    /// Create a model driven by an OS-seeded [`rand::rngs::SmallRng`].
    pub fn new() -> Self {
        Self::with_entropy(RngEntropy::from_os_rng())
    }

    /// Create a model with a deterministic random source.
    pub fn seeded(seed: u64) -> Self {
        Self::with_entropy(RngEntropy::seed_from_u64(seed))
    }

    /// Create a model driven by the given entropy source,
    /// observed for the first time right now.
    pub fn with_entropy(entropy: impl DriftEntropy) -> Self {
        Self::with_entropy_at(entropy, Instant::now())
    }

    /// Create a model driven by the given entropy source,
    /// with `created_at` as its first observation point.
    pub fn with_entropy_at(entropy: impl DriftEntropy, created_at: Instant) -> Self {
        Self {
            latency: 0.0,
            is_erroring: false,
            last_observed_at: created_at,
            error_bias_rate: DEFAULT_ERROR_BIAS_RATE,
            entropy: Box::new(entropy),
        }
    }

    /// Overwrite the error bias rate, clamped into `[0, 1]`.
    pub fn with_error_bias_rate(mut self, rate: f64) -> Self {
        self.error_bias_rate = if rate.is_nan() {
            0.0
        } else {
            rate.clamp(0.0, 1.0)
        };
        self
    }

    #[inline(always)]
    pub fn error_bias_rate(&self) -> f64 {
        self.error_bias_rate
    }

    #[inline(always)]
    pub fn last_observed_at(&self) -> Instant {
        self.last_observed_at
    }

    /// Current state, without advancing the walk.
    pub fn observation(&self) -> Observation {
        Observation {
            latency: Duration::try_from_secs_f64(self.latency).unwrap_or_default(),
            is_erroring: self.is_erroring,
        }
    }

    /// Advance the walk to `now` and return the resulting state.
    ///
    /// A `now` older than the previous observation counts as zero elapsed time
    /// and does not move the observation point backwards.
    /// A non-finite latency draw counts as no step at all.
    pub fn advance(&mut self, now: Instant) -> Observation {
        let elapsed = now.saturating_duration_since(self.last_observed_at);
        self.last_observed_at = self.last_observed_at.max(now);

        let delta = self.entropy.latency_delta();
        let delta = if delta.is_finite() {
            delta.clamp(-MAX_LATENCY_STEP, MAX_LATENCY_STEP) * latency_scale(elapsed)
        } else {
            0.0
        };
        self.latency = (self.latency + delta).max(0.0);

        let flip_threshold = self.error_bias_rate * error_scale(elapsed);
        if self.entropy.error_roll() < flip_threshold {
            self.is_erroring = !self.is_erroring;
        }

        self.observation()
    }

    /// Bring latency back to zero and clear the error flag.
    pub fn reset(&mut self) {
        self.latency = 0.0;
        self.is_erroring = false;
    }
}
