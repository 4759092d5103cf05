//! Test harness: an in-process guestbook node on an ephemeral port.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use guestbook_client::{App, NodeClient};
use guestbook_common::account::AccountId;
use guestbook_node::{build_router, open_runtime, NodeConfig, Runtime};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const CONTRACT_ID: &str = "guestbook.test";

/// A running node plus the handle keeping it alive.
pub struct TestNode {
    pub addr: SocketAddr,
    pub runtime: Arc<Runtime>,
    stop: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl TestNode {
    /// Start a node backed by a temporary store.
    pub async fn start() -> Self {
        let config = NodeConfig {
            temporary: true,
            ..NodeConfig::default()
        };
        Self::start_with(config).await
    }

    /// Start a node persisting under `dir`.
    pub async fn start_in(dir: PathBuf) -> Self {
        let config = NodeConfig {
            data_dir: Some(dir),
            ..NodeConfig::default()
        };
        Self::start_with(config).await
    }

    async fn start_with(config: NodeConfig) -> Self {
        init_tracing();
        let runtime = open_runtime(&config).expect("open runtime");
        let router = build_router(Arc::clone(&runtime));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = stopped.await;
                })
                .await
                .expect("serve");
        });
        TestNode {
            addr,
            runtime,
            stop,
            server,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> NodeClient {
        NodeClient::new(self.url(), contract_id())
    }

    pub fn app(&self) -> App<NodeClient> {
        App::new(self.client())
    }

    /// Stop serving, wait for open connections to drain and flush the store.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        self.server.await.expect("server task");
        self.runtime.store().flush().expect("flush");
    }
}

pub fn contract_id() -> AccountId {
    CONTRACT_ID.parse().expect("valid contract id")
}

pub fn account(name: &str) -> AccountId {
    name.parse().expect("valid account id")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
