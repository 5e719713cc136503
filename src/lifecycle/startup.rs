//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Open the configured store
//! - Bind the listener and serve until a signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)
//! - Once opened, the store is closed on every exit path

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{GatewayConfig, StorageBackend, StorageConfig};
use crate::http::{GatewayServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::net::Listener;
use crate::observability::metrics;
use crate::storage::{ExerciseStore, MemoryStore, MongoStore, StoreResult};

/// The opened Storage Port implementation.
pub enum StoreHandle {
    Memory(Arc<MemoryStore>),
    Mongo(Arc<MongoStore>),
}

impl StoreHandle {
    pub async fn open(config: &StorageConfig) -> StoreResult<Self> {
        match config.backend {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory store");
                Ok(StoreHandle::Memory(Arc::new(MemoryStore::new())))
            }
            StorageBackend::Mongodb => {
                let store = MongoStore::connect(config).await?;
                Ok(StoreHandle::Mongo(Arc::new(store)))
            }
        }
    }

    pub fn store(&self) -> Arc<dyn ExerciseStore> {
        match self {
            StoreHandle::Memory(store) => store.clone(),
            StoreHandle::Mongo(store) => store.clone(),
        }
    }

    pub async fn close(&self) {
        if let StoreHandle::Mongo(store) = self {
            store.shutdown().await;
        }
    }
}

/// Run the gateway with `config` until SIGINT or SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<(), ServerError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse().map_err(|e| {
            ServerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        metrics::init_metrics(addr)?;
    }

    let store = StoreHandle::open(&config.storage).await?;
    let result = serve(&config, store.store(), Shutdown::new(), true).await;
    store.close().await;
    result
}

async fn serve(
    config: &GatewayConfig,
    store: Arc<dyn ExerciseStore>,
    shutdown: Shutdown,
    handle_signals: bool,
) -> Result<(), ServerError> {
    let server = GatewayServer::new(config, store)?;
    let listener = Listener::bind(&config.listener).await?;

    if handle_signals {
        signals::spawn_signal_handler(shutdown.clone());
    }
    server.run(listener, shutdown).await
}
