//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use exercise_gateway::config::GatewayConfig;
use exercise_gateway::net::Listener;
use exercise_gateway::storage::{ExerciseStore, MemoryStore};
use exercise_gateway::{GatewayServer, ServerError, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A gateway running on an ephemeral local port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestGateway {
    /// Start an in-process gateway over a fresh memory store.
    pub async fn start() -> Self {
        Self::start_with(GatewayConfig::default(), Arc::new(MemoryStore::new())).await
    }

    pub async fn start_with(mut config: GatewayConfig, store: Arc<dyn ExerciseStore>) -> Self {
        config.listener.drain_timeout_secs = 2;
        let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = tcp.local_addr().unwrap();
        let listener = Listener::from_tcp(tcp, config.listener.max_connections).unwrap();

        let server = GatewayServer::new(&config, store).unwrap();
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(server.run(listener, shutdown.clone()));

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("gateway did not stop in time")
            .expect("gateway task panicked")
            .expect("gateway returned an error");
    }
}
