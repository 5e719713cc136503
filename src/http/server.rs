//! Gateway server setup.
//!
//! # Responsibilities
//! - Build the RPC service, the REST translator and the multiplexer
//! - Accept connections and run HTTP/1.1 or HTTP/2 on each (auto-detected)
//! - Terminate TLS when configured
//! - Stop accepting on shutdown and drain open connections
//!
//! # Design Decisions
//! - One Tokio task per connection; hyper serves its requests concurrently
//! - Shutdown asks every connection to finish in-flight requests, then waits
//!   up to the configured drain timeout

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsAcceptor;

use crate::config::{GatewayConfig, GatewayMode};
use crate::gateway::{self, ExerciseRpc, LocalRpc, RemoteRpc};
use crate::http::mux::Multiplexer;
use crate::lifecycle::Shutdown;
use crate::net::{load_tls_acceptor, ConnectionId, ConnectionTracker, Listener, ListenerError, TlsError};
use crate::proto::ExerciseServiceServer;
use crate::service::ExerciseApi;
use crate::storage::{ExerciseStore, StoreError};

/// The service every connection runs.
pub type GatewayService = Multiplexer<ExerciseServiceServer<ExerciseApi>, Router>;

/// Errors that stop the gateway process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("invalid gateway endpoint: {0}")]
    Endpoint(#[from] tonic::transport::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// gRPC and REST on one listener.
pub struct GatewayServer {
    service: GatewayService,
    tls: Option<TlsAcceptor>,
    tracker: ConnectionTracker,
    drain_timeout: Duration,
}

impl GatewayServer {
    /// Create a new gateway over `store`.
    pub fn new(config: &GatewayConfig, store: Arc<dyn ExerciseStore>) -> Result<Self, ServerError> {
        let api = ExerciseApi::new(store);

        let rpc: Arc<dyn ExerciseRpc> = match config.gateway.mode {
            GatewayMode::InProcess => Arc::new(LocalRpc::new(api.clone())),
            GatewayMode::Remote => Arc::new(RemoteRpc::connect_lazy(&config.gateway.endpoint)?),
        };
        let rest = gateway::rest_router(rpc, &config.gateway);
        let grpc = ExerciseServiceServer::new(api);

        let tls = config
            .listener
            .tls
            .as_ref()
            .map(load_tls_acceptor)
            .transpose()?;

        Ok(Self {
            service: Multiplexer::new(grpc, rest),
            tls,
            tracker: ConnectionTracker::new(),
            drain_timeout: Duration::from_secs(config.listener.drain_timeout_secs),
        })
    }

    /// A handle to the multiplexed service.
    pub fn service(&self) -> GatewayService {
        self.service.clone()
    }

    /// Serve until `shutdown` triggers, then drain.
    pub async fn run(self, listener: Listener, shutdown: Shutdown) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tls = self.tls.is_some(),
            "Gateway serving gRPC and REST"
        );

        loop {
            let accepted = tokio::select! {
                _ = shutdown.wait() => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, peer, permit) = match accepted {
                Ok(accepted) => accepted,
                Err(ListenerError::Accept(e)) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let guard = self.tracker.track();
            let service = self.service.clone();
            let tls = self.tls.clone();
            let shutdown = shutdown.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let id = guard.id();
                match tls {
                    Some(acceptor) => match acceptor.accept(stream).await {
                        Ok(stream) => serve_connection(stream, service, shutdown, id, peer).await,
                        Err(e) => tracing::debug!(
                            connection_id = %id,
                            peer_addr = %peer,
                            error = %e,
                            "TLS handshake failed"
                        ),
                    },
                    None => serve_connection(stream, service, shutdown, id, peer).await,
                }
                drop(guard);
            });
        }

        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Listener closed, draining connections"
        );
        if !self.tracker.drain(self.drain_timeout).await {
            tracing::warn!(
                active_connections = self.tracker.active_count(),
                timeout_secs = self.drain_timeout.as_secs(),
                "Drain timeout elapsed with connections still open"
            );
        }

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

async fn serve_connection<S>(
    stream: S,
    service: GatewayService,
    shutdown: Shutdown,
    id: ConnectionId,
    peer: SocketAddr,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    tracing::trace!(connection_id = %id, peer_addr = %peer, "Serving connection");

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(service));
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = shutdown.wait() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        tracing::debug!(connection_id = %id, peer_addr = %peer, error = %e, "Connection error");
    }
}
