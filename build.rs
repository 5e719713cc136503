//! Generates the `exrs.v1.ExerciseService` client and server stubs.
//!
//! Messages are declared by hand in `src/proto.rs` with `prost` derives, so
//! only the service plumbing is generated and no `protoc` is needed.

fn main() {
    let method = |name: &str, route: &str, input: &str, output: &str| {
        tonic_build::manual::Method::builder()
            .name(name)
            .route_name(route)
            .input_type(input)
            .output_type(output)
            .codec_path("tonic::codec::ProstCodec")
            .build()
    };

    let service = tonic_build::manual::Service::builder()
        .name("ExerciseService")
        .package("exrs.v1")
        .method(method(
            "get_exercise",
            "GetExercise",
            "crate::proto::GetExerciseRequest",
            "crate::proto::Exercise",
        ))
        .method(method(
            "create_exercise",
            "CreateExercise",
            "crate::proto::CreateExerciseRequest",
            "crate::proto::Exercise",
        ))
        .method(method(
            "update_exercise",
            "UpdateExercise",
            "crate::proto::UpdateRequest",
            "crate::proto::Exercise",
        ))
        .method(method(
            "delete_exercise",
            "DeleteExercise",
            "crate::proto::DeleteRequest",
            "crate::proto::Empty",
        ))
        .method(method(
            "list_exercises",
            "ListExercises",
            "crate::proto::ListExercisesRequest",
            "crate::proto::ListExercisesResponse",
        ))
        .build();

    tonic_build::manual::Builder::new().compile(&[service]);
    println!("cargo:rerun-if-changed=build.rs");
}
