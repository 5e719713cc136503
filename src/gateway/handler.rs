//! The catch-all REST handler.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{request::Parts, Request};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;

use crate::gateway::{builders, ExerciseRpc};
use crate::http::request::request_id;
use crate::http::response::{forward, RestError};
use crate::observability::metrics;
use crate::routing::{PathVars, RouteMatch, RouteTable};
use crate::service::Operation;

/// Shared state of the REST surface.
#[derive(Clone)]
pub struct RestState {
    rpc: Arc<dyn ExerciseRpc>,
    routes: Arc<RouteTable>,
    max_body_bytes: usize,
}

impl RestState {
    pub fn new(rpc: Arc<dyn ExerciseRpc>, max_body_bytes: usize) -> Self {
        Self {
            rpc,
            routes: Arc::new(RouteTable::exercises()),
            max_body_bytes,
        }
    }
}

/// Route the request through the table and translate it.
pub async fn dispatch(State(state): State<RestState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let (operation, response) = match state.routes.lookup(&parts.method, parts.uri.path()) {
        RouteMatch::Matched { route, vars } => {
            let result = execute(&state, route.operation, &vars, &parts, body).await;
            (route.operation.rpc_name(), result.unwrap_or_else(IntoResponse::into_response))
        }
        RouteMatch::MethodNotAllowed(allow) => (
            "none",
            RestError::method_not_allowed(&parts.method, allow).into_response(),
        ),
        RouteMatch::NotFound => ("none", RestError::no_route(parts.uri.path()).into_response()),
    };

    let status = response.status();
    tracing::debug!(
        request_id = %request_id(&parts.headers),
        operation,
        status = status.as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "REST request handled"
    );
    metrics::record_request("rest", operation, status.as_u16().to_string(), start);
    response
}

/// 413 when the body outgrows `limit`, 400 when the body stream fails.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, RestError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if exceeds_limit(&e) {
            return RestError::payload_too_large(limit);
        }
        tracing::debug!(error = %e, "Failed to read request body");
        RestError::invalid_argument(format!("unreadable request body: {}", e))
    })
}

fn exceeds_limit(error: &axum::Error) -> bool {
    std::iter::successors(Some(error as &(dyn StdError + 'static)), |e: &&(dyn StdError + 'static)| (*e).source())
        .any(|e| e.is::<LengthLimitError>())
}

async fn execute(
    state: &RestState,
    operation: Operation,
    vars: &PathVars<'_>,
    parts: &Parts,
    body: Body,
) -> Result<Response, RestError> {
    let rpc = &state.rpc;
    let response = match operation {
        Operation::Get => {
            let request = builders::get_request(vars)?;
            forward(&rpc.get_exercise(request).await?)
        }
        Operation::Create => {
            let body = read_body(body, state.max_body_bytes).await?;
            let request = builders::create_request(&body)?;
            forward(&rpc.create_exercise(request).await?)
        }
        Operation::Update => {
            let body = read_body(body, state.max_body_bytes).await?;
            let request = builders::update_request(vars, parts.uri.query(), &body)?;
            forward(&rpc.update_exercise(request).await?)
        }
        Operation::Delete => {
            let request = builders::delete_request(vars)?;
            rpc.delete_exercise(request).await?;
            forward(&serde_json::json!({}))
        }
        Operation::List => {
            let request = builders::list_request(parts.uri.query());
            forward(&rpc.list_exercises(request).await?)
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewaySection;
    use crate::gateway::{rest_router, LocalRpc};
    use crate::service::ExerciseApi;
    use crate::storage::{
        ExerciseStore, ListFilter, MemoryStore, StoreError, StoreResult, StoredExercise,
        UpdateMask,
    };
    use crate::service::tests::FailingStore;
    use async_trait::async_trait;
    use axum::http::{header, Method, StatusCode};
    use futures_util::stream;
    use std::io;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Read(String),
        Update(String, StoredExercise, UpdateMask),
    }

    /// Records calls and answers with canned values.
    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExerciseStore for RecordingStore {
        async fn create(&self, exercise: StoredExercise) -> StoreResult<StoredExercise> {
            Ok(exercise)
        }
        async fn read(&self, id: &str) -> StoreResult<StoredExercise> {
            self.calls.lock().unwrap().push(Call::Read(id.to_string()));
            Ok(StoredExercise {
                id: id.to_string(),
                ..Default::default()
            })
        }
        async fn update(
            &self,
            id: &str,
            exercise: StoredExercise,
            mask: &UpdateMask,
        ) -> StoreResult<StoredExercise> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(id.to_string(), exercise.clone(), mask.clone()));
            Ok(exercise)
        }
        async fn delete(&self, id: &str) -> StoreResult<bool> {
            Err(StoreError::NotFound(id.to_string()))
        }
        async fn list(&self, _: &ListFilter) -> StoreResult<Vec<StoredExercise>> {
            Ok(Vec::new())
        }
    }

    fn router(store: Arc<dyn ExerciseStore>) -> axum::Router {
        let rpc = Arc::new(LocalRpc::new(ExerciseApi::new(store)));
        rest_router(rpc, &GatewaySection::default())
    }

    async fn send(router: &axum::Router, method: Method, uri: &str, body: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        router.clone().oneshot(request).await.unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn get_reads_path_id_verbatim() {
        let store = Arc::new(RecordingStore::default());
        let app = router(store.clone());

        let response = send(&app, Method::GET, "/v1/exercises/abc123", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.calls(), vec![Call::Read("abc123".into())]);
    }

    #[tokio::test]
    async fn patch_updates_only_named_fields() {
        let store = Arc::new(RecordingStore::default());
        let app = router(store.clone());

        let response = send(&app, Method::PATCH, "/v1/exercises/abc123", r#"{"name":"Squat"}"#).await;
        assert_eq!(response.status(), StatusCode::OK);

        let expected = StoredExercise {
            name: "Squat".into(),
            ..Default::default()
        };
        let mask = UpdateMask::from_paths(["name"]).unwrap();
        assert_eq!(
            store.calls(),
            vec![Call::Update("abc123".into(), expected, mask)]
        );
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let app = router(Arc::new(MemoryStore::new()));

        let created = send(
            &app,
            Method::POST,
            "/v1/exercises",
            r#"{"name":"Pushup","kind":"bodyweight"}"#,
        )
        .await;
        assert_eq!(created.status(), StatusCode::OK);
        let created = json(created).await;
        assert_eq!(
            created,
            serde_json::json!({"id": "1", "name": "Pushup", "kind": "bodyweight"})
        );

        let fetched = json(send(&app, Method::GET, "/v1/exercises/1", "").await).await;
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn empty_list_is_an_empty_array() {
        let app = router(Arc::new(MemoryStore::new()));
        let response = send(&app, Method::GET, "/v1/exercises", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!({"exercises": []}));
    }

    #[tokio::test]
    async fn delete_answers_empty_object_and_maps_not_found() {
        let app = router(Arc::new(MemoryStore::new()));
        send(&app, Method::POST, "/v1/exercises", r#"{"name":"Plank"}"#).await;

        let response = send(&app, Method::DELETE, "/v1/exercises/1", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!({}));

        let response = send(&app, Method::DELETE, "/v1/exercises/1", "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["code"], 5);
    }

    #[tokio::test]
    async fn bad_input_is_400_without_store_call() {
        let store = Arc::new(RecordingStore::default());
        let app = router(store.clone());

        let response = send(&app, Method::PATCH, "/v1/exercises/7", "[1]").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = send(&app, Method::GET, "/v1/exercises/", "").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn routing_misses() {
        let app = router(Arc::new(MemoryStore::new()));

        let response = send(&app, Method::GET, "/v2/things", "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, Method::PUT, "/v1/exercises/1", "{}").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, PATCH, DELETE");
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let app = router(Arc::new(MemoryStore::new()));
        let request = Request::builder()
            .uri("/v1/exercises")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn store_failures_map_to_http_statuses() {
        let cases: [(fn() -> StoreError, StatusCode, i64); 3] = [
            (
                || StoreError::WriteConflict("duplicate key".into()),
                StatusCode::CONFLICT,
                6,
            ),
            (
                || StoreError::Unavailable("connection refused".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                14,
            ),
            (
                || StoreError::Internal("bad document".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                13,
            ),
        ];
        for (error, status, code) in cases {
            let app = router(Arc::new(FailingStore(error)));

            let response = send(&app, Method::POST, "/v1/exercises", r#"{"name":"Pushup"}"#).await;
            assert_eq!(response.status(), status);
            let body = json(response).await;
            assert_eq!(body["code"], code);
            assert!(body["message"].is_string());

            let response = send(&app, Method::GET, "/v1/exercises", "").await;
            assert_eq!(response.status(), status);
        }
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let body = Body::from(vec![b' '; 64]);
        let err = read_body(body, 16).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn broken_body_stream_is_bad_request() {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"{\"name\":")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
        ];
        let body = Body::from_stream(stream::iter(chunks));
        let err = read_body(body, 1024).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn empty_sequence_in_body_is_echoed() {
        let app = router(Arc::new(MemoryStore::new()));
        let response = send(
            &app,
            Method::POST,
            "/v1/exercises",
            r#"{"name":"Pushup","categories":[]}"#,
        )
        .await;
        assert_eq!(
            json(response).await,
            serde_json::json!({"id": "1", "name": "Pushup", "categories": []})
        );

        let fetched = json(send(&app, Method::GET, "/v1/exercises/1", "").await).await;
        assert_eq!(fetched["categories"], serde_json::json!([]));
        assert!(fetched.get("muscles").is_none());
    }
}
