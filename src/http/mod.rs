//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (hyper auto: HTTP/1.1 or HTTP/2)
//!     → mux.rs (gRPC or REST, per request)
//!         gRPC → tonic ExerciseServiceServer
//!         REST → request.rs (request ID, span) → gateway translator
//!     → response.rs (JSON body, status mapping)
//!     → Send to client
//! ```

pub mod mux;
pub mod request;
pub mod response;
pub mod server;

pub use mux::{classify, Multiplexer, Protocol};
pub use request::X_REQUEST_ID;
pub use response::RestError;
pub use server::{GatewayServer, GatewayService, ServerError};
