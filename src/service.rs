//! RPC service over the Storage Port.
//!
//! # Responsibilities
//! - Decode request messages with the entity codec
//! - Delegate to the configured `ExerciseStore`
//! - Map storage failures onto gRPC status codes
//!
//! # Design Decisions
//! - Holds nothing but the store handle; safe to share across tasks
//! - Every operation yields a response value, empty on failure, next to the
//!   status ([`Reply`]); the gRPC surface only forwards the status
//! - `list` never yields a missing sequence

use std::sync::Arc;
use std::time::Instant;

use tonic::{Code, Request, Response, Status};

use crate::codec::{to_storage, to_wire, to_wire_list};
use crate::observability::metrics;
use crate::proto::{
    CreateExerciseRequest, DeleteRequest, Empty, Exercise, ExerciseService, GetExerciseRequest,
    ListExercisesRequest, ListExercisesResponse, UpdateRequest,
};
use crate::storage::{ExerciseStore, ListFilter, StoreError, UpdateMask};

/// The five exercise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Create,
    Update,
    Delete,
    List,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Get,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::List,
    ];

    /// RPC method name within `exrs.v1.ExerciseService`.
    pub fn rpc_name(&self) -> &'static str {
        match self {
            Operation::Get => "GetExercise",
            Operation::Create => "CreateExercise",
            Operation::Update => "UpdateExercise",
            Operation::Delete => "DeleteExercise",
            Operation::List => "ListExercises",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.rpc_name())
    }
}

/// Map a storage failure to its transport status.
pub fn status_from_store(err: &StoreError) -> Status {
    let code = match err {
        StoreError::NotFound(_) => Code::NotFound,
        StoreError::InvalidId(_) => Code::InvalidArgument,
        StoreError::WriteConflict(_) => Code::AlreadyExists,
        StoreError::Unavailable(_) => Code::Unavailable,
        StoreError::Internal(_) => Code::Internal,
    };
    Status::new(code, err.to_string())
}

/// Outcome of an operation. `message` is always present and is the empty
/// value when `status` is set.
#[derive(Debug)]
pub struct Reply<T> {
    pub message: T,
    pub status: Option<Status>,
}

impl<T: Default> Reply<T> {
    fn ok(message: T) -> Self {
        Self {
            message,
            status: None,
        }
    }

    fn failed(status: Status) -> Self {
        Self {
            message: T::default(),
            status: Some(status),
        }
    }

    /// Code reported to metrics and logs.
    pub fn code(&self) -> Code {
        self.status.as_ref().map_or(Code::Ok, Status::code)
    }

    pub fn into_result(self) -> Result<T, Status> {
        match self.status {
            Some(status) => Err(status),
            None => Ok(self.message),
        }
    }
}

/// Exercise API backed by one shared store.
#[derive(Clone)]
pub struct ExerciseApi {
    store: Arc<dyn ExerciseStore>,
}

impl ExerciseApi {
    pub fn new(store: Arc<dyn ExerciseStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateExerciseRequest) -> Reply<Exercise> {
        let start = Instant::now();
        let mut exercise = to_storage(request.exercise.as_ref()).unwrap_or_default();
        exercise.id.clear();
        tracing::debug!(name = %exercise.name, "Creating exercise");

        let reply = match self.store.create(exercise).await {
            Ok(created) => {
                tracing::debug!(id = %created.id, "Created exercise");
                Reply::ok(to_wire(Some(&created)).unwrap_or_default())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed creating exercise");
                Reply::failed(status_from_store(&e))
            }
        };
        metrics::record_rpc(Operation::Create, reply.code(), start);
        reply
    }

    pub async fn get(&self, request: GetExerciseRequest) -> Reply<Exercise> {
        let start = Instant::now();
        tracing::debug!(id = %request.id, "Getting exercise");

        let reply = match self.store.read(&request.id).await {
            Ok(found) => Reply::ok(to_wire(Some(&found)).unwrap_or_default()),
            Err(e) => {
                tracing::warn!(id = %request.id, error = %e, "Could not read exercise");
                Reply::failed(status_from_store(&e))
            }
        };
        metrics::record_rpc(Operation::Get, reply.code(), start);
        reply
    }

    /// Overwrite the fields named by `update_mask`, or every non-empty field
    /// of `exercise` when no mask is given.
    pub async fn update(&self, request: UpdateRequest) -> Reply<Exercise> {
        let start = Instant::now();
        let exercise = to_storage(request.exercise.as_ref()).unwrap_or_default();

        let mask = match request.update_mask.as_ref().filter(|m| !m.paths.is_empty()) {
            Some(field_mask) => match UpdateMask::from_paths(&field_mask.paths) {
                Ok(mask) => mask,
                Err(path) => {
                    let reply = Reply::failed(Status::invalid_argument(format!(
                        "update_mask names unknown field {:?}",
                        path
                    )));
                    metrics::record_rpc(Operation::Update, reply.code(), start);
                    return reply;
                }
            },
            None => UpdateMask::non_empty(&exercise),
        };
        tracing::debug!(id = %request.id, fields = ?mask, "Updating exercise");

        let reply = match self.store.update(&request.id, exercise, &mask).await {
            Ok(updated) => Reply::ok(to_wire(Some(&updated)).unwrap_or_default()),
            Err(e) => {
                tracing::warn!(id = %request.id, error = %e, "Could not update exercise");
                Reply::failed(status_from_store(&e))
            }
        };
        metrics::record_rpc(Operation::Update, reply.code(), start);
        reply
    }

    pub async fn delete(&self, request: DeleteRequest) -> Reply<()> {
        let start = Instant::now();
        tracing::debug!(id = %request.id, "Deleting exercise");

        let reply = match self.store.delete(&request.id).await {
            Ok(_) => Reply::ok(()),
            Err(e) => {
                tracing::warn!(id = %request.id, error = %e, "Failed to delete exercise");
                Reply::failed(status_from_store(&e))
            }
        };
        metrics::record_rpc(Operation::Delete, reply.code(), start);
        reply
    }

    pub async fn list(&self, request: ListExercisesRequest) -> Reply<ListExercisesResponse> {
        let start = Instant::now();
        let filter = list_filter(request);
        tracing::debug!(filter = ?filter, "Listing exercises");

        let reply = match self.store.list(&filter).await {
            Ok(records) => {
                let exercises = to_wire_list(Some(records)).unwrap_or_default();
                tracing::debug!(count = exercises.len(), "Listed exercises");
                Reply::ok(ListExercisesResponse { exercises })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list exercises");
                Reply::failed(status_from_store(&e))
            }
        };
        metrics::record_rpc(Operation::List, reply.code(), start);
        reply
    }
}

fn list_filter(request: ListExercisesRequest) -> ListFilter {
    let non_empty = |s: String| (!s.is_empty()).then_some(s);
    ListFilter {
        kind: non_empty(request.kind),
        name: non_empty(request.name),
        muscle_group: non_empty(request.muscle_group),
    }
}

#[tonic::async_trait]
impl ExerciseService for ExerciseApi {
    async fn get_exercise(
        &self,
        request: Request<GetExerciseRequest>,
    ) -> Result<Response<Exercise>, Status> {
        self.get(request.into_inner()).await.into_result().map(Response::new)
    }

    async fn create_exercise(
        &self,
        request: Request<CreateExerciseRequest>,
    ) -> Result<Response<Exercise>, Status> {
        self.create(request.into_inner()).await.into_result().map(Response::new)
    }

    async fn update_exercise(
        &self,
        request: Request<UpdateRequest>,
    ) -> Result<Response<Exercise>, Status> {
        self.update(request.into_inner()).await.into_result().map(Response::new)
    }

    async fn delete_exercise(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<Empty>, Status> {
        self.delete(request.into_inner()).await.into_result().map(Response::new)
    }

    async fn list_exercises(
        &self,
        request: Request<ListExercisesRequest>,
    ) -> Result<Response<ListExercisesResponse>, Status> {
        self.list(request.into_inner()).await.into_result().map(Response::new)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StoreResult, StoredExercise};
    use async_trait::async_trait;

    /// A store whose every call fails with the configured error.
    /// Fails every call with the error it was built with.
    pub(crate) struct FailingStore(pub(crate) fn() -> StoreError);

    #[async_trait]
    impl ExerciseStore for FailingStore {
        async fn create(&self, _: StoredExercise) -> StoreResult<StoredExercise> {
            Err((self.0)())
        }
        async fn read(&self, _: &str) -> StoreResult<StoredExercise> {
            Err((self.0)())
        }
        async fn update(
            &self,
            _: &str,
            _: StoredExercise,
            _: &UpdateMask,
        ) -> StoreResult<StoredExercise> {
            Err((self.0)())
        }
        async fn delete(&self, _: &str) -> StoreResult<bool> {
            Err((self.0)())
        }
        async fn list(&self, _: &ListFilter) -> StoreResult<Vec<StoredExercise>> {
            Err((self.0)())
        }
    }

    fn memory_api() -> ExerciseApi {
        ExerciseApi::new(Arc::new(MemoryStore::new()))
    }

    fn pushup() -> Exercise {
        Exercise {
            name: "Pushup".into(),
            kind: "bodyweight".into(),
            ..Default::default()
        }
    }

    #[test]
    fn storage_errors_map_to_status_codes() {
        let cases = [
            (StoreError::NotFound("x".into()), Code::NotFound),
            (StoreError::InvalidId("x".into()), Code::InvalidArgument),
            (StoreError::WriteConflict("x".into()), Code::AlreadyExists),
            (StoreError::Unavailable("x".into()), Code::Unavailable),
            (StoreError::Internal("x".into()), Code::Internal),
        ];
        for (err, code) in cases {
            assert_eq!(status_from_store(&err).code(), code);
        }
    }

    #[tokio::test]
    async fn create_mints_id_and_ignores_client_id() {
        let api = memory_api();
        let mut exercise = pushup();
        exercise.id = "client-chosen".into();

        let created = api
            .create(CreateExerciseRequest {
                exercise: Some(exercise),
            })
            .await
            .into_result()
            .unwrap();
        assert!(!created.id.is_empty());
        assert_ne!(created.id, "client-chosen");
        assert_eq!(created.name, "Pushup");
    }

    #[tokio::test]
    async fn get_reports_not_found_and_invalid_id() {
        let api = memory_api();
        let missing = api.get(GetExerciseRequest { id: "41".into() }).await;
        assert_eq!(missing.code(), Code::NotFound);
        assert_eq!(missing.message, Exercise::default());

        let malformed = api.get(GetExerciseRequest { id: "abc123".into() }).await;
        assert_eq!(malformed.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn update_without_mask_keeps_empty_fields() {
        let api = memory_api();
        let created = api
            .create(CreateExerciseRequest {
                exercise: Some(pushup()),
            })
            .await
            .into_result()
            .unwrap();

        let updated = api
            .update(UpdateRequest {
                id: created.id.clone(),
                exercise: Some(Exercise {
                    name: "Wide pushup".into(),
                    ..Default::default()
                }),
                update_mask: None,
            })
            .await
            .into_result()
            .unwrap();
        assert_eq!(updated.name, "Wide pushup");
        assert_eq!(updated.kind, "bodyweight");
    }

    #[tokio::test]
    async fn update_with_mask_can_blank_a_field() {
        let api = memory_api();
        let created = api
            .create(CreateExerciseRequest {
                exercise: Some(pushup()),
            })
            .await
            .into_result()
            .unwrap();

        let updated = api
            .update(UpdateRequest {
                id: created.id,
                exercise: Some(Exercise::default()),
                update_mask: Some(prost_types::FieldMask {
                    paths: vec!["kind".into()],
                }),
            })
            .await
            .into_result()
            .unwrap();
        assert_eq!(updated.kind, "");
        assert_eq!(updated.name, "Pushup");
    }

    #[tokio::test]
    async fn update_rejects_unknown_mask_path() {
        let api = memory_api();
        let reply = api
            .update(UpdateRequest {
                id: "1".into(),
                exercise: None,
                update_mask: Some(prost_types::FieldMask {
                    paths: vec!["id".into()],
                }),
            })
            .await;
        assert_eq!(reply.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn list_on_empty_store_is_empty_not_missing() {
        let reply = memory_api().list(ListExercisesRequest::default()).await;
        assert_eq!(reply.into_result().unwrap().exercises, Vec::new());
    }

    #[tokio::test]
    async fn failures_still_carry_empty_responses() {
        let api = ExerciseApi::new(Arc::new(FailingStore(|| {
            StoreError::Unavailable("connection refused".into())
        })));

        let listed = api.list(ListExercisesRequest::default()).await;
        assert_eq!(listed.code(), Code::Unavailable);
        assert!(listed.message.exercises.is_empty());

        let created = api.create(CreateExerciseRequest::default()).await;
        assert_eq!(created.code(), Code::Unavailable);
        assert_eq!(created.message, Exercise::default());

        let deleted = api.delete(DeleteRequest { id: "1".into() }).await;
        assert_eq!(deleted.code(), Code::Unavailable);
    }

    #[tokio::test]
    async fn grpc_surface_forwards_status() {
        let api = ExerciseApi::new(Arc::new(FailingStore(|| {
            StoreError::WriteConflict("duplicate key".into())
        })));
        let err = ExerciseService::create_exercise(
            &api,
            Request::new(CreateExerciseRequest {
                exercise: Some(pushup()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), Code::AlreadyExists);
    }
}
