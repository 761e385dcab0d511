use std::{collections::BTreeMap, time::Duration};

mod human;
mod json;

pub use self::{human::HumanReporter, json::JsonlReporter};

#[cfg(test)]
mod collect;

#[cfg(test)]
pub(crate) use self::collect::{CollectReporter, Collected};

pub trait Reporter: Send + Sync + 'static {
    fn on_result(&mut self, ev: &RequestResultEvent);
    fn on_tick(&mut self, now: Duration);
    fn finish(&mut self, total_time: Duration);
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counters {
    pub total: u64,
    pub ok: u64,
    pub http_fail: u64,
    pub other_fail: u64,
    pub latency_total: Duration,
    pub statuses: BTreeMap<u16, u64>,
}

impl Counters {
    pub fn apply(&mut self, ev: &RequestResultEvent) {
        self.total += 1;
        self.latency_total += ev.latency;

        if let Some(status) = ev.outcome.status {
            *self.statuses.entry(status).or_default() += 1;
        }

        match ev.outcome.failure {
            None => self.ok += 1,
            Some(FailureKind::HttpStatus) => self.http_fail += 1,
            Some(FailureKind::Other) => self.other_fail += 1,
        }
    }

    /// Mean latency over all results, `None` if there are none.
    pub fn average_latency(&self) -> Option<Duration> {
        (self.total > 0).then(|| {
            Duration::from_nanos((self.latency_total.as_nanos() / self.total as u128) as u64)
        })
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.http_fail + self.other_fail
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    HttpStatus,
    Other,
}

impl FailureKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::HttpStatus => "http_status",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub status: Option<u16>,
    pub failure: Option<FailureKind>,
}

impl RequestOutcome {
    /// Classify a received status code, 2xx and 3xx count as ok.
    pub fn from_status(status: u16) -> Self {
        Self {
            status: Some(status),
            failure: (!(200..400).contains(&status)).then_some(FailureKind::HttpStatus),
        }
    }

    /// Outcome of a request that did not result in a complete response.
    pub fn transport_failure(status: Option<u16>) -> Self {
        Self {
            status,
            failure: Some(FailureKind::Other),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct RequestResultEvent {
    /// time since the start of the bench run
    pub elapsed: Duration,
    pub index: usize,
    pub latency: Duration,
    pub outcome: RequestOutcome,
}

/// Round to whole milliseconds, for human consumption.
fn round_to_millis(d: Duration) -> Duration {
    Duration::from_millis(((d.as_nanos() + 500_000) / 1_000_000) as u64)
}
