use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use super::{Counters, Reporter, RequestResultEvent};

#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub(crate) counters: Counters,
    pub(crate) indices: Vec<usize>,
    pub(crate) finished: bool,
}

/// Keeps every result in memory, to assert on once the run is over.
pub(crate) struct CollectReporter(pub(crate) Arc<Mutex<Collected>>);

impl Reporter for CollectReporter {
    fn on_result(&mut self, ev: &RequestResultEvent) {
        let mut collected = self.0.lock().unwrap();
        collected.counters.apply(ev);
        collected.indices.push(ev.index);
    }

    fn on_tick(&mut self, _now: Duration) {}

    fn finish(&mut self, _total_time: Duration) {
        self.0.lock().unwrap().finished = true;
    }
}
