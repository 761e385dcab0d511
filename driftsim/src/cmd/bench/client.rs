use std::time::Duration;

use rama::{
    Layer as _, Service as _,
    error::{BoxError, ErrorContext as _},
    http::{Request, Response, client::EasyHttpWebClient},
    layer::TimeoutLayer,
    rt::Executor,
    service::BoxService,
};

/// Plain HTTP client used to hit the drift server,
/// giving up on a single request after `timeout`.
pub fn http_client(
    exec: Executor,
    timeout: Duration,
) -> Result<BoxService<Request, Response, BoxError>, BoxError> {
    let inner = EasyHttpWebClient::connector_builder()
        .with_default_transport_connector()
        .without_tls_proxy_support()
        .without_proxy_support()
        .without_tls_support()
        .with_default_http_connector(exec)
        .try_with_default_connection_pool()
        .context("create connection pool for bench web client")?
        .build_client();

    Ok(TimeoutLayer::new(timeout).into_layer(inner).boxed())
}
