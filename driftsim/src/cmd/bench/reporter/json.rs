use std::{
    io::{Stdout, Write},
    time::Duration,
};

use rama::telemetry::tracing;
use serde_json::{Value, json};

use super::{Counters, Reporter, RequestResultEvent};

/// JSON lines reporter, for consumption by other tools.
///
/// Emits `event` lines (optional, one per result),
/// `summary` lines (one per tick) and a single `final` line.
pub struct JsonlReporter<W = Stdout> {
    writer: W,
    interval: Duration,
    last_tick: Duration,
    interval_counts: Counters,
    total_counts: Counters,
    emit_events: bool,
}

impl JsonlReporter {
    pub fn new(interval: Duration, emit_events: bool) -> Self {
        Self::with_writer(interval, emit_events, std::io::stdout())
    }
}

impl<W> JsonlReporter<W> {
    pub fn with_writer(interval: Duration, emit_events: bool, writer: W) -> Self {
        Self {
            writer,
            interval,
            last_tick: Duration::ZERO,
            interval_counts: Counters::default(),
            total_counts: Counters::default(),
            emit_events,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> JsonlReporter<W> {
    fn emit(&mut self, line: Value) {
        if let Err(err) = writeln!(self.writer, "{line}") {
            tracing::debug!("failed to write bench report line: {err}");
        }
    }
}

fn as_millis_f64(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1e6
}

fn counts_json(c: &Counters) -> Value {
    json!({
        "total": c.total,
        "ok": c.ok,
        "http_fail": c.http_fail,
        "other_fail": c.other_fail,
    })
}

impl<W> Reporter for JsonlReporter<W>
where
    W: Write + Send + Sync + 'static,
{
    fn on_result(&mut self, ev: &RequestResultEvent) {
        self.interval_counts.apply(ev);
        self.total_counts.apply(ev);

        if self.emit_events {
            self.emit(json!({
                "type": "event",
                "t_ms": ev.elapsed.as_millis(),
                "index": ev.index,
                "latency_ms": as_millis_f64(ev.latency),
                "ok": ev.outcome.is_ok(),
                "status": ev.outcome.status,
                "failure": ev.outcome.failure.map(|f| f.as_str()),
            }));
        }
    }

    fn on_tick(&mut self, now: Duration) {
        let window = now.saturating_sub(self.last_tick);
        if window < self.interval || window.is_zero() {
            return;
        }
        self.last_tick = now;

        let rps = self.interval_counts.total as f64 / window.as_secs_f64();
        let interval_counts = std::mem::take(&mut self.interval_counts);

        let line = json!({
            "type": "summary",
            "t_ms": now.as_millis(),
            "interval_ms": window.as_millis(),
            "rps": rps,
            "interval": counts_json(&interval_counts),
            "total": counts_json(&self.total_counts),
        });
        self.emit(line);
    }

    fn finish(&mut self, total_time: Duration) {
        let total = std::mem::take(&mut self.total_counts);

        self.emit(json!({
            "type": "final",
            "total_time_ms": total_time.as_millis(),
            "average_latency_ms": total
                .average_latency()
                .map(as_millis_f64),
            "total": counts_json(&total),
            "statuses": total.statuses,
        }));
    }
}
