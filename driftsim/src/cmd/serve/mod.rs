use std::path::PathBuf;

use rama::{
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    net::socket::Interface,
    rt::Executor,
    telemetry::tracing,
};

use clap::Args;
use driftsim_lib::{
    drift::{DriftModel, SharedDriftModel},
    server::{self, DriftServer},
};

#[derive(Debug, Clone, Args)]
/// run the drifting mock server
pub struct ServeCommand {
    /// network interface to bind to
    #[arg(
        long,
        short = 'b',
        value_name = "INTERFACE",
        default_value = server::DEFAULT_BIND_INTERFACE,
    )]
    pub bind: Interface,
}

pub async fn exec(
    data: PathBuf,
    guard: ShutdownGuard,
    args: ServeCommand,
) -> Result<(), BoxError> {
    tokio::fs::create_dir_all(&data)
        .await
        .with_context(|| format!("create data directory at path '{}'", data.display()))?;

    let drift_server = DriftServer::bind(args.bind, Executor::graceful(guard)).await?;

    server::write_server_socket_address_as_file(
        &data,
        driftsim_lib::utils::env::project_name(),
        drift_server.socket_address(),
    )
    .await?;

    // shared by all connections for the lifetime of the process
    let model = DriftModel::new();
    tracing::info!(
        error_bias_rate = model.error_bias_rate(),
        "drift model ready",
    );

    drift_server.serve(SharedDriftModel::new(model)).await;

    Ok(())
}
