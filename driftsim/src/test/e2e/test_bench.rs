use std::sync::{Arc, Mutex};

use rama::graceful::Shutdown;

use crate::{
    cmd::bench::{
        BenchPlan,
        reporter::{CollectReporter, Collected},
        run_bench,
    },
    config::Strategy,
    test::e2e,
};

#[tokio::test]
#[tracing_test::traced_test]
async fn test_bench_against_server() {
    let runtime = e2e::runtime::get().await;
    let target = runtime.server_socket_addr().to_string();

    for strategy in ["sequential", "unbounded", "fan-out"] {
        e2e::runtime::run_driftsim(&[
            "--graceful",
            "1",
            "bench",
            target.as_str(),
            "--requests",
            "12",
            "--concurrency",
            "3",
            "--strategy",
            strategy,
        ])
        .await
        .unwrap_or_else(|err| panic!("bench with strategy '{strategy}' failed: {err}"));
    }
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_bench_json_report() {
    let runtime = e2e::runtime::get().await;
    let target = runtime.server_socket_addr().to_string();

    e2e::runtime::run_driftsim(&["bench", target.as_str(), "--requests", "5", "--json"])
        .await
        .unwrap();
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_bench_counts_every_request() {
    const REQUESTS: usize = 12;

    let runtime = e2e::runtime::get().await;

    for strategy in [Strategy::Sequential, Strategy::Unbounded, Strategy::FanOut] {
        let collected = Arc::new(Mutex::new(Collected::default()));
        let shutdown = Shutdown::new(std::future::pending::<()>());

        run_bench(
            shutdown.guard(),
            runtime.client(),
            runtime.data_url(),
            BenchPlan {
                requests: REQUESTS,
                concurrency: 3,
                strategy,
            },
            Box::new(CollectReporter(collected.clone())),
        )
        .await;

        let collected = collected.lock().unwrap();
        let counters = &collected.counters;
        assert!(collected.finished, "{strategy:?}");
        assert_eq!(counters.total, REQUESTS as u64, "{strategy:?}");
        assert_eq!(counters.other_fail, 0, "{strategy:?}: {counters:?}");
        assert_eq!(
            counters.ok + counters.http_fail,
            REQUESTS as u64,
            "{strategy:?}"
        );
        assert!(
            counters.statuses.keys().all(|status| *status == 200 || *status == 500),
            "{strategy:?}: {counters:?}"
        );
        assert_eq!(
            counters.statuses.values().sum::<u64>(),
            REQUESTS as u64,
            "{strategy:?}"
        );
        assert_eq!(
            counters.statuses.get(&500).copied().unwrap_or_default(),
            counters.http_fail,
            "{strategy:?}"
        );

        let mut indices = collected.indices.clone();
        indices.sort_unstable();
        assert_eq!(indices, (0..REQUESTS).collect::<Vec<_>>(), "{strategy:?}");
    }
}
