//! Exercise gateway library.
//!
//! Serves the exercise CRUD API over gRPC and over a JSON/HTTP facade on one
//! port.

// Domain
pub mod codec;
pub mod proto;
pub mod service;
pub mod storage;

// Transport
pub mod gateway;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use http::{GatewayServer, ServerError};
pub use lifecycle::Shutdown;
pub use service::ExerciseApi;
