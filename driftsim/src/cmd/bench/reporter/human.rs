use std::{
    io::{Stdout, Write},
    time::Duration,
};

use rama::telemetry::tracing;

use super::{Counters, Reporter, RequestResultEvent, round_to_millis};

/// Plain text reporter, one line per tick and a multi-line summary when done.
pub struct HumanReporter<W = Stdout> {
    writer: W,
    interval: Duration,
    last_tick: Duration,
    interval_counts: Counters,
    total_counts: Counters,
}

impl HumanReporter {
    pub fn new(interval: Duration) -> Self {
        Self::with_writer(interval, std::io::stdout())
    }
}

impl<W> HumanReporter<W> {
    pub fn with_writer(interval: Duration, writer: W) -> Self {
        Self {
            writer,
            interval,
            last_tick: Duration::ZERO,
            interval_counts: Counters::default(),
            total_counts: Counters::default(),
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> HumanReporter<W> {
    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.writer, "{line}") {
            tracing::debug!("failed to write bench report line: {err}");
        }
    }
}

impl<W> Reporter for HumanReporter<W>
where
    W: Write + Send + Sync + 'static,
{
    fn on_result(&mut self, ev: &RequestResultEvent) {
        self.interval_counts.apply(ev);
        self.total_counts.apply(ev);
    }

    fn on_tick(&mut self, now: Duration) {
        let window = now.saturating_sub(self.last_tick);
        if window < self.interval || window.is_zero() {
            return;
        }
        self.last_tick = now;

        let rps = self.interval_counts.total as f64 / window.as_secs_f64();
        let interval_counts = std::mem::take(&mut self.interval_counts);

        self.emit(format_args!(
            "t={:.1}s rps={:.1} ok={} http_fail={} other_fail={} total_ok={} total_fail={}",
            now.as_secs_f64(),
            rps,
            interval_counts.ok,
            interval_counts.http_fail,
            interval_counts.other_fail,
            self.total_counts.ok,
            self.total_counts.failed(),
        ));
    }

    fn finish(&mut self, total_time: Duration) {
        let total = std::mem::take(&mut self.total_counts);

        self.emit(format_args!(
            "done total={} ok={} http_fail={} other_fail={}",
            total.total, total.ok, total.http_fail, total.other_fail,
        ));

        match total.average_latency() {
            Some(latency) => self.emit(format_args!(
                "average latency: {}",
                humantime::format_duration(round_to_millis(latency)),
            )),
            None => self.emit(format_args!("average latency: n/a")),
        }

        self.emit(format_args!(
            "total time: {}",
            humantime::format_duration(round_to_millis(total_time)),
        ));

        let statuses = total
            .statuses
            .iter()
            .map(|(status, count)| format!("{status}={count}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.emit(format_args!("status counts: {statuses}"));
    }
}
