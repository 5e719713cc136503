//! Exercise gateway.
//!
//! gRPC and REST clients share one listener; each request is dispatched on
//! its HTTP version and content type.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                    EXERCISE GATEWAY                      │
//!                 │                                                          │
//!   Client        │  ┌─────────┐    ┌───────────┐  HTTP/2 + application/grpc │
//!   ──────────────┼─▶│   net   │───▶│ http::mux │───────────────┐            │
//!                 │  │listener │    └─────┬─────┘               ▼            │
//!                 │  │  + TLS  │          │ otherwise    ┌──────────────┐    │
//!                 │  └─────────┘          ▼              │   service    │    │
//!                 │               ┌──────────────┐       │ ExerciseApi  │    │
//!                 │               │   gateway    │──────▶│   + codec    │    │
//!                 │               │ REST → RPC   │       └──────┬───────┘    │
//!                 │               └──────────────┘              ▼            │
//!                 │                                     ┌──────────────┐     │
//!                 │                                     │   storage    │─────┼──▶ MongoDB
//!                 │                                     │memory / mongo│     │
//!                 │                                     └──────────────┘     │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use exercise_gateway::config::{load_config, GatewayConfig};
use exercise_gateway::{lifecycle, observability};

#[derive(Parser)]
#[command(name = "exercise-gateway")]
#[command(about = "Exercise CRUD API over gRPC and REST on one port", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply without it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => GatewayConfig::default(),
    };

    if let Err(e) = observability::logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        storage = ?config.storage.backend,
        mode = ?config.gateway.mode,
        "exercise-gateway starting"
    );

    match lifecycle::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}
