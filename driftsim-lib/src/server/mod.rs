use std::{path::Path, sync::Arc};

use rama::{
    Layer as _,
    error::{BoxError, ErrorContext as _},
    http::{
        HeaderValue,
        layer::{required_header::AddRequiredResponseHeadersLayer, trace::TraceLayer},
        server::HttpServer,
    },
    net::{address::SocketAddress, socket::Interface},
    rt::Executor,
    tcp::server::TcpListener,
    telemetry::tracing,
};

use crate::{drift::SharedDriftModel, utils};

/// Default interface the drift server binds to.
pub const DEFAULT_BIND_INTERFACE: &str = "0.0.0.0:5000";

/// A bound (but not yet serving) drift server.
pub struct DriftServer {
    exec: Executor,
    listener: TcpListener,
    socket_address: SocketAddress,
}

impl std::fmt::Debug for DriftServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriftServer")
            .field("socket_address", &self.socket_address)
            .finish_non_exhaustive()
    }
}

impl DriftServer {
    /// Bind the drift server to the given interface.
    ///
    /// Connections are served on the (graceful) executor,
    /// and thus stop once the executor's shutdown is triggered.
    pub async fn bind(interface: Interface, exec: Executor) -> Result<Self, BoxError> {
        let listener = TcpListener::bind(interface, exec.clone())
            .await
            .context("bind drift http server")?;

        let socket_address: SocketAddress = listener
            .local_addr()
            .context("get bound address for drift http server")?
            .into();

        tracing::info!(%socket_address, "drift http server bound");

        Ok(Self {
            exec,
            listener,
            socket_address,
        })
    }

    #[inline(always)]
    pub fn socket_address(&self) -> SocketAddress {
        self.socket_address
    }

    /// Serve `GET /data` using the given model for all connections.
    ///
    /// Connection lifetime is not capped: a keep-alive connection
    /// can serve requests for as long as the client keeps it open.
    pub async fn serve(self, model: SharedDriftModel) {
        let http_svc = (
            TraceLayer::new_for_http(),
            AddRequiredResponseHeadersLayer::new()
                .with_server_header_value(HeaderValue::from_static(utils::env::server_identifier())),
        )
            .into_layer(crate::http::drift_web_svc(model));

        let http_server = HttpServer::auto(self.exec).service(Arc::new(http_svc));

        tracing::info!(socket_address = %self.socket_address, "serving drift http server");
        self.listener.serve(http_server).await;
    }
}

/// Write the socket address of a server to `<dir>/<name>.addr.txt`,
/// so it can be discovered when bound to an ephemeral port.
pub async fn write_server_socket_address_as_file(
    dir: &Path,
    name: &str,
    addr: SocketAddress,
) -> Result<(), BoxError> {
    let path = dir.join(format!("{name}.addr.txt"));
    tokio::fs::write(&path, addr.to_string())
        .await
        .with_context(|| {
            format!(
                "write socket address '{addr}' for server '{name}' to file '{}'",
                path.display()
            )
        })
}
