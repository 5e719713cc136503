//! REST client for the exercise gateway.

mod client;

pub use client::{ApiError, Exercise, ExerciseClient, ExerciseList, ListQuery, SdkError};
