//! Response handling for the REST surface.
//!
//! # Responsibilities
//! - Serialize RPC responses as JSON with HTTP 200
//! - Map gRPC status codes to HTTP status codes
//! - Render errors as `{"error", "code", "message"}` JSON bodies
//!
//! # Design Decisions
//! - One error type ([`RestError`]) for every REST failure, routing misses included
//! - Codes with no closer HTTP meaning become 500

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tonic::{Code, Status};

/// HTTP status for a gRPC code.
pub fn http_status(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::AlreadyExists => StatusCode::CONFLICT,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Serialize a successful RPC response.
pub fn forward<T: Serialize>(message: &T) -> Response {
    (StatusCode::OK, Json(message)).into_response()
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: i32,
    message: &'a str,
}

/// A failed REST request.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status}: {message}")]
pub struct RestError {
    status: StatusCode,
    code: Code,
    message: String,
    allow: Vec<Method>,
}

impl RestError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            status: http_status(code),
            code,
            message: message.into(),
            allow: Vec::new(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    /// No route for this path.
    pub fn no_route(path: &str) -> Self {
        Self::new(Code::NotFound, format!("no route for path {:?}", path))
    }

    /// The path is routed, but not for this method.
    pub fn method_not_allowed(method: &Method, allow: Vec<Method>) -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            code: Code::Unimplemented,
            message: format!("method {} not allowed", method),
            allow,
        }
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            code: Code::ResourceExhausted,
            message: format!("request body exceeds {} bytes", limit),
            allow: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Status> for RestError {
    fn from(status: Status) -> Self {
        Self::new(status.code(), status.message())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code as i32,
            message: &self.message,
        };
        let mut response = (self.status, Json(body)).into_response();

        if !self.allow.is_empty() {
            let allow = self
                .allow
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}
