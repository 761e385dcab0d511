use rama::http::{BodyExtractExt as _, StatusCode, service::client::HttpClientExt as _};
use serde_json::Value;

use crate::test::e2e;

#[tokio::test]
#[tracing_test::traced_test]
async fn test_data_responds_ok_or_simulated_error() {
    let runtime = e2e::runtime::get().await;
    let client = runtime.client();

    for _ in 0..25 {
        let resp = client.get(runtime.data_url()).send().await.unwrap();
        let status = resp.status();

        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(
            content_type.starts_with("application/json"),
            "content-type = {content_type}"
        );

        let payload: Value = resp.try_into_json().await.unwrap();
        match status {
            StatusCode::OK => assert_eq!(payload["message"], "Hello, World!"),
            StatusCode::INTERNAL_SERVER_ERROR => {
                assert_eq!(payload["error"], "Simulated server error")
            }
            other => panic!("unexpected status code: {other}"),
        }
    }
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_server_header() {
    let runtime = e2e::runtime::get().await;

    let resp = runtime
        .client()
        .get(runtime.data_url())
        .send()
        .await
        .unwrap();

    let server = resp
        .headers()
        .get("server")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_owned();
    assert!(server.starts_with("driftsim/"), "server = {server}");
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_unknown_path_not_found() {
    let runtime = e2e::runtime::get().await;

    let resp = runtime
        .client()
        .get(format!("http://{}/health", runtime.server_socket_addr()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
