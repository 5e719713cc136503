//! Request builders: HTTP pieces → RPC request messages.
//!
//! Every failure here is `INVALID_ARGUMENT` and happens before the RPC
//! service is called.

use prost_types::FieldMask;
use serde_json::Value;

use crate::http::response::RestError;
use crate::proto::{
    CreateExerciseRequest, DeleteRequest, Exercise, GetExerciseRequest, ListExercisesRequest,
    UpdateRequest,
};
use crate::routing::PathVars;
use crate::storage::{ExerciseField, UpdateMask};

/// A decoded JSON body and the top-level keys it named.
#[derive(Debug, Default)]
struct JsonBody {
    exercise: Exercise,
    keys: Vec<String>,
}

/// Decode a JSON object into an exercise. A blank body is `{}`; a `null`
/// member decodes as the field's empty value, which for a sequence is "not
/// given" rather than `[]`.
fn decode_body(body: &[u8]) -> Result<JsonBody, RestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(JsonBody::default());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RestError::invalid_argument(format!("malformed JSON body: {}", e)))?;
    let Value::Object(mut object) = value else {
        return Err(RestError::invalid_argument(
            "request body must be a JSON object",
        ));
    };

    let keys = object.keys().cloned().collect();
    object.retain(|_, member| !member.is_null());
    let exercise = serde_json::from_value(Value::Object(object))
        .map_err(|e| RestError::invalid_argument(format!("invalid exercise: {}", e)))?;

    Ok(JsonBody { exercise, keys })
}

fn path_id(vars: &PathVars<'_>) -> Result<String, RestError> {
    vars.required("id")
        .map_err(|e| RestError::invalid_argument(e.to_string()))
}

fn query_pairs(query: Option<&str>) -> impl Iterator<Item = (String, String)> + '_ {
    url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()).into_owned()
}

pub fn get_request(vars: &PathVars<'_>) -> Result<GetExerciseRequest, RestError> {
    Ok(GetExerciseRequest { id: path_id(vars)? })
}

pub fn create_request(body: &[u8]) -> Result<CreateExerciseRequest, RestError> {
    let JsonBody { exercise, .. } = decode_body(body)?;
    Ok(CreateExerciseRequest {
        exercise: Some(exercise),
    })
}

/// The mask is the `update_mask` query parameter when present, otherwise
/// the body's recognised keys.
pub fn update_request(
    vars: &PathVars<'_>,
    query: Option<&str>,
    body: &[u8],
) -> Result<UpdateRequest, RestError> {
    let id = path_id(vars)?;
    let JsonBody { exercise, keys } = decode_body(body)?;

    let explicit: Option<Vec<String>> = query_pairs(query)
        .filter(|(key, _)| key == "update_mask" || key == "updateMask")
        .map(|(_, value)| {
            value
                .split(',')
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(String::from)
                .collect()
        })
        .last();

    let paths = match explicit {
        Some(paths) => paths,
        None => keys
            .iter()
            .filter_map(|key| ExerciseField::from_path(key))
            .collect::<UpdateMask>()
            .iter()
            .map(|field| field.as_str().to_string())
            .collect(),
    };

    Ok(UpdateRequest {
        id,
        exercise: Some(exercise),
        update_mask: Some(FieldMask { paths }),
    })
}

pub fn delete_request(vars: &PathVars<'_>) -> Result<DeleteRequest, RestError> {
    Ok(DeleteRequest { id: path_id(vars)? })
}

/// Unknown query parameters are ignored.
pub fn list_request(query: Option<&str>) -> ListExercisesRequest {
    let mut request = ListExercisesRequest::default();
    for (key, value) in query_pairs(query) {
        match key.as_str() {
            "kind" => request.kind = value,
            "name" => request.name = value,
            "muscle_group" | "muscleGroup" => request.muscle_group = value,
            _ => {}
        }
    }
    request
}
