//! REST Translator.
//!
//! # Data Flow
//! ```text
//! HTTP/1.1 or non-gRPC HTTP/2 request
//!     → routing::RouteTable (method + path → Operation, path variables)
//!     → builders.rs (path / query / JSON body → RPC request message)
//!     → ExerciseRpc (in-process ExerciseApi or remote gRPC client)
//!     → http::response (JSON 200, or status → HTTP error body)
//! ```
//!
//! # Design Decisions
//! - The translator only speaks the RPC contract, never the store
//! - One catch-all handler consults the fixed route table
//! - Updates carry an explicit field mask inferred from the body keys

pub mod backend;
pub mod builders;
pub mod handler;

use std::sync::Arc;

use async_trait::async_trait;
use axum::routing::any;
use axum::Router;
use tonic::Status;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewaySection;
use crate::http::request;
use crate::proto::{
    CreateExerciseRequest, DeleteRequest, Exercise, GetExerciseRequest, ListExercisesRequest,
    ListExercisesResponse, UpdateRequest,
};

pub use backend::{LocalRpc, RemoteRpc};
pub use handler::RestState;

/// The RPC surface the translator calls into.
#[async_trait]
pub trait ExerciseRpc: Send + Sync {
    async fn create_exercise(&self, request: CreateExerciseRequest) -> Result<Exercise, Status>;

    async fn get_exercise(&self, request: GetExerciseRequest) -> Result<Exercise, Status>;

    async fn update_exercise(&self, request: UpdateRequest) -> Result<Exercise, Status>;

    async fn delete_exercise(&self, request: DeleteRequest) -> Result<(), Status>;

    async fn list_exercises(
        &self,
        request: ListExercisesRequest,
    ) -> Result<ListExercisesResponse, Status>;
}

/// Build the REST router over `rpc`.
pub fn rest_router(rpc: Arc<dyn ExerciseRpc>, config: &GatewaySection) -> Router {
    let state = RestState::new(rpc, config.max_body_bytes);

    Router::new()
        .route("/", any(handler::dispatch))
        .route("/{*path}", any(handler::dispatch))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(request::set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(request::make_span))
                .layer(request::propagate_request_id_layer())
                .layer(RequestBodyLimitLayer::new(config.max_body_bytes)),
        )
}
