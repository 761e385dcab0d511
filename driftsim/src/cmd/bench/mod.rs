use std::{pin::pin, sync::Arc, time::Duration};

use rama::{
    Service,
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    http::{BodyExtractExt as _, Request, Response, service::client::HttpClientExt as _},
    net::address::SocketAddress,
    rt::Executor,
    telemetry::tracing,
};

use clap::Args;
use driftsim_lib::http::DATA_PATH;
use tokio::{
    sync::{
        Semaphore,
        mpsc::{self, Receiver, Sender},
    },
    time::Instant,
};

use crate::config::{ClientConfig, Strategy};

pub mod client;
pub mod reporter;

use self::reporter::*;

const DEFAULT_TARGET: &str = "127.0.0.1:5000";
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Args)]
/// load the drifting endpoint and report what it observed
pub struct BenchCommand {
    /// socket address of the drift server
    #[arg(value_name = "ADDRESS", default_value = DEFAULT_TARGET)]
    target: SocketAddress,

    /// report json instead of a human-friendly format
    #[arg(long, default_value_t = false)]
    json: bool,

    #[clap(flatten)]
    config: Option<ClientConfig>,
}

/// What a bench run does, resolved from the [`ClientConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchPlan {
    pub requests: usize,
    pub concurrency: usize,
    pub strategy: Strategy,
}

impl From<&ClientConfig> for BenchPlan {
    fn from(cfg: &ClientConfig) -> Self {
        Self {
            requests: cfg.requests(),
            concurrency: cfg.concurrency(),
            strategy: cfg.strategy(),
        }
    }
}

pub async fn exec(guard: ShutdownGuard, args: BenchCommand) -> Result<(), BoxError> {
    let cfg = args.config.unwrap_or_default();
    let plan = BenchPlan::from(&cfg);
    let timeout = cfg.timeout();

    tracing::info!(
        target = %args.target,
        requests = plan.requests,
        concurrency = plan.concurrency,
        strategy = ?plan.strategy,
        ?timeout,
        "bench config parameters ready",
    );

    let client = self::client::http_client(Executor::graceful(guard.clone()), timeout)
        .context("create bench http client")?;

    let reporter: Box<dyn Reporter> = if args.json {
        const EMIT_EVENTS: bool = true;
        Box::new(JsonlReporter::new(REPORT_INTERVAL, EMIT_EVENTS))
    } else {
        Box::new(HumanReporter::new(REPORT_INTERVAL))
    };

    let url = format!("http://{}{DATA_PATH}", args.target);
    run_bench(guard, client, url, plan, reporter).await;

    Ok(())
}

/// Send `plan.requests` GET requests to `url` and feed their results to the reporter,
/// returning once all results are reported or the guard is cancelled.
pub async fn run_bench<C>(
    guard: ShutdownGuard,
    client: C,
    url: String,
    plan: BenchPlan,
    reporter: Box<dyn Reporter>,
) where
    C: Service<Request, Output = Response, Error = BoxError> + Clone,
{
    let start = Instant::now();
    let (result_tx, result_rx) = mpsc::channel(plan.concurrency.max(1) * 8);

    tokio::join!(
        dispatch_requests(guard.clone(), client, Arc::from(url), plan, result_tx, start),
        report_results(guard, reporter, result_rx, start),
    );
}

async fn dispatch_requests<C>(
    guard: ShutdownGuard,
    client: C,
    url: Arc<str>,
    plan: BenchPlan,
    result_tx: Sender<RequestResultEvent>,
    start: Instant,
) where
    C: Service<Request, Output = Response, Error = BoxError> + Clone,
{
    let mut cancelled = pin!(guard.clone_weak().into_cancelled());

    if plan.strategy == Strategy::Sequential {
        for index in 0..plan.requests {
            let (latency, outcome) = tokio::select! {
                _ = cancelled.as_mut() => {
                    tracing::error!("exit bench dispatcher early: guard shutdown");
                    return;
                }
                result = timed_request(&client, &url) => result,
            };

            send_result(&result_tx, start, index, latency, outcome).await;
        }

        tracing::debug!("sequential bench dispatcher done: exit");
        return;
    }

    let limit = (plan.strategy == Strategy::FanOut)
        .then(|| Arc::new(Semaphore::new(plan.concurrency)));

    for index in 0..plan.requests {
        let permit = match &limit {
            Some(semaphore) => tokio::select! {
                _ = cancelled.as_mut() => {
                    tracing::error!("exit bench dispatcher early: guard shutdown");
                    return;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => Some(permit),
                    Err(err) => {
                        tracing::error!("exit bench dispatcher early: semaphore closed: {err}");
                        return;
                    }
                },
            },
            None => None,
        };

        let client = client.clone();
        let url = url.clone();
        let result_tx = result_tx.clone();

        guard.spawn_task_fn(async move |guard| {
            let _permit = permit;

            let (latency, outcome) = tokio::select! {
                _ = guard.cancelled() => {
                    tracing::debug!("cancel bench request #{index}: guard shutdown");
                    return;
                }
                result = timed_request(&client, &url) => result,
            };

            send_result(&result_tx, start, index, latency, outcome).await;
        });
    }

    tracing::debug!(
        strategy = ?plan.strategy,
        "all bench requests dispatched: exit",
    );
}

async fn timed_request<C>(client: &C, url: &str) -> (Duration, RequestOutcome)
where
    C: Service<Request, Output = Response, Error = BoxError>,
{
    let req_start = Instant::now();

    let outcome = match client.get(url.to_owned()).send().await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            match resp.try_into_string().await {
                Ok(_) => RequestOutcome::from_status(status),
                Err(err) => {
                    tracing::debug!("failed to read response body (status = {status}): {err}");
                    RequestOutcome::transport_failure(Some(status))
                }
            }
        }
        Err(err) => {
            tracing::debug!("non-http error: {err}");
            RequestOutcome::transport_failure(None)
        }
    };

    (req_start.elapsed(), outcome)
}

async fn send_result(
    result_tx: &Sender<RequestResultEvent>,
    start: Instant,
    index: usize,
    latency: Duration,
    outcome: RequestOutcome,
) {
    let ev = RequestResultEvent {
        elapsed: start.elapsed(),
        index,
        latency,
        outcome,
    };

    if let Err(err) = result_tx.send(ev).await {
        tracing::debug!("failed to send bench result msg: {err}");
    }
}

async fn report_results(
    guard: ShutdownGuard,
    mut reporter: Box<dyn Reporter>,
    mut result_rx: Receiver<RequestResultEvent>,
    start: Instant,
) {
    loop {
        let ev = tokio::select! {
            _ = guard.cancelled() => {
                tracing::debug!("exit report worker: guard shutdown");
                break;
            }

            maybe_ev = result_rx.recv() => {
                let Some(ev) = maybe_ev else {
                    tracing::debug!("exit report worker: result senders closed");
                    break;
                };

                ev
            }
        };

        reporter.on_result(&ev);
        reporter.on_tick(start.elapsed());
    }

    reporter.finish(start.elapsed());
}
