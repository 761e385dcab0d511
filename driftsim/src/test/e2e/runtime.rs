use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, LazyLock, OnceLock},
    time::Duration,
};

use clap::Parser;
use rama::{
    error::BoxError,
    http::{Request, Response},
    net::address::SocketAddress,
    rt::Executor,
    service::BoxService,
};

use crate::Args;

#[derive(Clone)]
pub(super) struct Runtime {
    _app: App,

    server_addr: SocketAddress,
}

impl Runtime {
    #[inline(always)]
    pub fn server_socket_addr(&self) -> SocketAddress {
        self.server_addr
    }

    #[inline(always)]
    pub fn data_url(&self) -> String {
        format!(
            "http://{}{}",
            self.server_addr,
            driftsim_lib::http::DATA_PATH
        )
    }

    #[inline(always)]
    pub fn client(&self) -> BoxService<Request, Response, BoxError> {
        crate::cmd::bench::client::http_client(Executor::default(), Duration::from_secs(30))
            .unwrap()
    }
}

#[derive(Clone)]
struct App {
    data_dir: PathBuf,
}

impl App {
    fn new() -> Self {
        let data_dir = spawn_driftsim_server();
        Self { data_dir }
    }
}

/// Shared drift server, spawned on first use.
pub(super) async fn get() -> Runtime {
    static APP: LazyLock<App> = LazyLock::new(App::new);

    let app = APP.clone();

    let server_addr = tokio::time::timeout(
        Duration::from_secs(60),
        read_file_or_wait(app.data_dir.join("driftsim.addr.txt")),
    )
    .await
    .unwrap();

    let runtime = Runtime {
        _app: app,
        server_addr,
    };

    assert!(runtime.server_socket_addr().ip_addr.is_loopback());
    assert_ne!(runtime.server_socket_addr().port, 0);

    runtime
}

async fn read_file_or_wait(path: PathBuf) -> SocketAddress {
    loop {
        match tokio::fs::read_to_string(&path).await {
            Ok(s) => {
                let s = s.trim();
                if s.is_empty() {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
                match s.parse() {
                    Ok(addr) => return addr,
                    Err(err) => {
                        eprintln!("unexpected error parsing socket addr (content={s:?}): {err}");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
}

/// Run `driftsim` with the given (global and command) arguments
/// until the command is finished.
pub(super) async fn run_driftsim(argv: &[&str]) -> Result<(), BoxError> {
    let mut full_argv = vec![driftsim_lib::utils::env::project_name()];
    full_argv.extend(argv);

    let args = Args::try_parse_from(full_argv).unwrap();
    crate::run_with_args(std::future::pending::<()>(), args).await
}

fn spawn_driftsim_server() -> PathBuf {
    let data_dir =
        driftsim_lib::utils::test::unique_empty_temp_dir("driftsim_app_e2e").unwrap();
    eprintln!("driftsim_app_e2e all data stored under: {data_dir:?}");

    let data_dir_str = data_dir.display().to_string();

    let args = Args::try_parse_from([
        driftsim_lib::utils::env::project_name(),
        "--data",
        data_dir_str.as_str(),
        "--graceful",
        "0.42",
        "serve",
        "--bind",
        "127.0.0.1:0",
    ])
    .unwrap();

    let wait_server_ready = Arc::new(OnceLock::new());
    let notify_server_ready = wait_server_ready.clone();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let server_future = crate::run_with_args(std::future::pending::<()>(), args);

        notify_server_ready.set(()).expect("waiter to be notified");

        rt.block_on(server_future).expect("serve without errors");
    });

    wait_server_ready.wait();

    data_dir
}
