//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use dynamic_router::config::RouterConfig;
use dynamic_router::{HttpServer, Resolver, Shutdown};

/// A router running on ephemeral ports.
#[allow(dead_code)]
pub struct TestRouter {
    pub addr: SocketAddr,
    /// Bound when `admin.enabled` is set.
    pub admin_addr: Option<SocketAddr>,
    pub resolver: Resolver,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<RouterConfig>,
}

#[allow(dead_code)]
impl TestRouter {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        let addr = self.admin_addr.expect("admin API not enabled");
        format!("http://{}/admin/{}", addr, path)
    }
}

/// Start a router with `config`. The main and admin listeners bind free
/// ports on 127.0.0.1.
pub async fn start_router(mut config: RouterConfig) -> TestRouter {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let admin_listener = if config.admin.enabled {
        config.admin.bind_address = "127.0.0.1:0".to_string();
        Some(TcpListener::bind(&config.admin.bind_address).await.unwrap())
    } else {
        None
    };
    let admin_addr = admin_listener.as_ref().map(|l| l.local_addr().unwrap());

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let resolver = server.resolver().clone();

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server
            .serve(listener, admin_listener, config_updates, server_shutdown)
            .await;
    });

    // Let the spawned task subscribe to shutdown and start serving
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestRouter {
        addr,
        admin_addr,
        resolver,
        shutdown,
        config_tx,
    }
}

/// Client without pooling or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
