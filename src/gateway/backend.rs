//! Implementations of [`ExerciseRpc`].

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint, Error as TransportError};
use tonic::Status;

use crate::gateway::ExerciseRpc;
use crate::proto::{
    CreateExerciseRequest, DeleteRequest, Exercise, ExerciseServiceClient, GetExerciseRequest,
    ListExercisesRequest, ListExercisesResponse, UpdateRequest,
};
use crate::service::ExerciseApi;

/// Calls the RPC service in the same process.
#[derive(Clone)]
pub struct LocalRpc {
    api: ExerciseApi,
}

impl LocalRpc {
    pub fn new(api: ExerciseApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ExerciseRpc for LocalRpc {
    async fn create_exercise(&self, request: CreateExerciseRequest) -> Result<Exercise, Status> {
        self.api.create(request).await.into_result()
    }

    async fn get_exercise(&self, request: GetExerciseRequest) -> Result<Exercise, Status> {
        self.api.get(request).await.into_result()
    }

    async fn update_exercise(&self, request: UpdateRequest) -> Result<Exercise, Status> {
        self.api.update(request).await.into_result()
    }

    async fn delete_exercise(&self, request: DeleteRequest) -> Result<(), Status> {
        self.api.delete(request).await.into_result()
    }

    async fn list_exercises(
        &self,
        request: ListExercisesRequest,
    ) -> Result<ListExercisesResponse, Status> {
        self.api.list(request).await.into_result()
    }
}

/// Forwards to a gRPC endpoint over a lazily connected channel.
#[derive(Clone)]
pub struct RemoteRpc {
    client: ExerciseServiceClient<Channel>,
}

impl RemoteRpc {
    /// The channel connects on first use; an unreachable endpoint surfaces
    /// as `UNAVAILABLE` on each call.
    pub fn connect_lazy(endpoint: &str) -> Result<Self, TransportError> {
        let channel = Endpoint::from_shared(endpoint.to_string())?.connect_lazy();
        tracing::info!(endpoint = %endpoint, "REST translator forwarding to remote gRPC endpoint");
        Ok(Self {
            client: ExerciseServiceClient::new(channel),
        })
    }
}

#[async_trait]
impl ExerciseRpc for RemoteRpc {
    async fn create_exercise(&self, request: CreateExerciseRequest) -> Result<Exercise, Status> {
        let response = self.client.clone().create_exercise(request).await?;
        Ok(response.into_inner())
    }

    async fn get_exercise(&self, request: GetExerciseRequest) -> Result<Exercise, Status> {
        let response = self.client.clone().get_exercise(request).await?;
        Ok(response.into_inner())
    }

    async fn update_exercise(&self, request: UpdateRequest) -> Result<Exercise, Status> {
        let response = self.client.clone().update_exercise(request).await?;
        Ok(response.into_inner())
    }

    async fn delete_exercise(&self, request: DeleteRequest) -> Result<(), Status> {
        let response = self.client.clone().delete_exercise(request).await?;
        Ok(response.into_inner())
    }

    async fn list_exercises(
        &self,
        request: ListExercisesRequest,
    ) -> Result<ListExercisesResponse, Status> {
        let response = self.client.clone().list_exercises(request).await?;
        Ok(response.into_inner())
    }
}
