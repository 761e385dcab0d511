#![cfg_attr(
    not(test),
    warn(clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
    time::Duration,
};

use rama::{
    error::BoxError,
    graceful,
    telemetry::tracing::{self, Instrument as _},
};

#[cfg(target_family = "unix")]
use rama::error::ErrorContext as _;

use clap::{Parser, Subcommand};
use driftsim_lib::utils;

pub mod cmd;
pub mod config;

#[cfg(target_family = "unix")]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(test)]
pub mod test;

/// CLI arguments for configuring driftsim behavior.
#[derive(Debug, Clone, Parser)]
#[command(name = "driftsim")]
#[command(bin_name = "driftsim")]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    cmds: CliCommands,

    /// debug logging as default instead of Info; use RUST_LOG env for more options
    #[arg(long, short = 'v', default_value_t = false, global = true)]
    pub verbose: bool,

    /// enable pretty logging (format for humans)
    #[arg(long, default_value_t = false, global = true)]
    pub pretty: bool,

    /// write the tracing output to the provided (log) file instead of stderr
    #[arg(long, short = 'o', global = true)]
    pub output: Option<PathBuf>,

    /// directory in which data (e.g. bound server addresses) will be stored
    #[arg(long, short = 'D', default_value = ".driftsim", global = true)]
    pub data: PathBuf,

    #[arg(long, value_name = "SECONDS", default_value_t = 1., global = true)]
    /// the graceful shutdown timeout (<= 0.0 = no timeout)
    pub graceful: f64,

    #[cfg(target_family = "unix")]
    /// Set the limit of max open file descriptors for this process and its children.
    #[arg(long, value_name = "N", default_value_t = 65_536, global = true)]
    pub ulimit: utils::os::rlim_t,
}

#[derive(Debug, Clone, Subcommand)]
enum CliCommands {
    Serve(self::cmd::serve::ServeCommand),
    Bench(self::cmd::bench::BenchCommand),
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();

    utils::telemetry::init_tracing(utils::telemetry::TelemetryConfig {
        verbose: args.verbose,
        pretty: args.pretty,
        output: args.output.as_deref(),
    })?;

    #[cfg(target_family = "unix")]
    utils::os::raise_nofile(args.ulimit).context("set file descriptor limit")?;

    let base_shutdown_signal = graceful::default_signal();
    if let Err(err) = run_with_args(base_shutdown_signal, args).await {
        eprintln!("🚩 exit with error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

/// Runs the selected driftsim command and blocks until it is finished,
/// it failed or the (graceful) shutdown has been initiated.
///
/// This entry point is used by both the (binary) `main` function as well as
/// for the e2e test suite found in the test module.
async fn run_with_args<F>(base_shutdown_signal: F, args: Args) -> Result<(), BoxError>
where
    F: Future<Output: Send + 'static> + Send + 'static,
{
    let graceful_timeout = (args.graceful > 0.).then(|| Duration::from_secs_f64(args.graceful));

    let (error_tx, error_rx) = tokio::sync::oneshot::channel::<BoxError>();
    let graceful = graceful::Shutdown::new(new_shutdown_signal(error_rx, base_shutdown_signal));

    let cmd_failure = Arc::new(OnceLock::<String>::new());

    graceful.spawn_task_fn({
        let cmd_failure = cmd_failure.clone();

        async move |guard| {
            let result = match args.cmds {
                CliCommands::Serve(serve_args) => {
                    self::cmd::serve::exec(args.data, guard, serve_args)
                        .instrument(tracing::debug_span!(
                            "drift server lifetime",
                            server.service.name = utils::env::project_name(),
                            otel.kind = "server",
                            network.protocol.name = "http",
                        ))
                        .await
                }
                CliCommands::Bench(bench_args) => {
                    self::cmd::bench::exec(guard, bench_args)
                        .instrument(tracing::debug_span!(
                            "bench client lifetime",
                            otel.kind = "client",
                            network.protocol.name = "http",
                        ))
                        .await
                }
            };

            if let Err(err) = result {
                tracing::error!("command exited with an error: {err}");
                let _ = cmd_failure.set(err.to_string());
                let _ = error_tx.send(err);
            }
        }
    });

    let delay = match graceful_timeout {
        Some(duration) => graceful.shutdown_with_limit(duration).await?,
        None => graceful.shutdown().await,
    };

    tracing::debug!("gracefully shutdown with a delay of: {delay:?}");

    match cmd_failure.get() {
        Some(msg) => Err(BoxError::from(msg.clone())),
        None => Ok(()),
    }
}

fn new_shutdown_signal(
    error_rx: tokio::sync::oneshot::Receiver<BoxError>,
    base_shutdown_signal: impl Future<Output: Send + 'static> + Send + 'static,
) -> impl Future + Send + 'static {
    async move {
        tokio::select! {
            _ = base_shutdown_signal => {
                tracing::debug!("default signal triggered: init graceful shutdown");
            }
            result = error_rx => {
                match result {
                    Ok(err) => {
                        tracing::error!("fatal err received: {err}; abort");
                    },
                    Err(_) => {
                        tracing::debug!("command is finished without error, return control");
                    },
                }
            }
        }
    }
}
