use std::time::Duration;

/// Client side load generation configuration.
/// Undefined properties fall back to the defaults below.
#[derive(Debug, Clone, clap::Args, Default)]
pub struct ClientConfig {
    /// Total amount of requests to send.
    #[arg(long, value_name = "N")]
    pub requests: Option<usize>,

    /// Maximum number of in flight requests (fan-out strategy only).
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Time after which a single request is given up on.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// How requests are scheduled.
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,
}

impl ClientConfig {
    pub const DEFAULT_REQUESTS: usize = 7500;
    pub const DEFAULT_CONCURRENCY: usize = 15;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn requests(&self) -> usize {
        self.requests.unwrap_or(Self::DEFAULT_REQUESTS)
    }

    /// Concurrency limit, at least one.
    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(Self::DEFAULT_CONCURRENCY).max(1)
    }

    /// Per request timeout, non-positive values fall back to the default.
    pub fn timeout(&self) -> Duration {
        self.timeout
            .filter(|secs| *secs > 0.)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy.unwrap_or_default()
    }
}

/// Scheduling of bench requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum Strategy {
    /// One request at a time, each waiting for the previous response.
    Sequential,

    /// All requests are started at once.
    /// Used to observe how the server behaves under a thundering herd.
    Unbounded,

    /// A fixed amount of requests in flight at any time.
    #[default]
    FanOut,
}
