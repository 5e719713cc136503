//! Protocol multiplexer: gRPC and REST behind one listener.
//!
//! # Responsibilities
//! - Classify each request as gRPC or REST from its version and headers
//! - Dispatch to the matching inner service
//! - Unify both response bodies into one body type
//!
//! # Design Decisions
//! - Classification is a pure function; every request goes to exactly one side
//! - gRPC requires HTTP/2 and an `application/grpc*` content type; anything
//!   else, including gRPC-Web over HTTP/1.1, is REST

use std::convert::Infallible;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Response, Version};
use axum::BoxError;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use tower::{Service, ServiceExt};

use crate::observability::metrics;
use crate::service::Operation;

/// Which side of the gateway serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Grpc,
    Rest,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Grpc => "grpc",
            Protocol::Rest => "rest",
        }
    }
}

/// Decide the protocol of a request.
pub fn classify(version: Version, headers: &HeaderMap) -> Protocol {
    let grpc_content = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/grpc"));

    if version == Version::HTTP_2 && grpc_content {
        Protocol::Grpc
    } else {
        Protocol::Rest
    }
}

/// Service that routes each request to `grpc` or `rest`.
#[derive(Debug, Clone)]
pub struct Multiplexer<G, R> {
    grpc: G,
    rest: R,
}

impl<G, R> Multiplexer<G, R> {
    pub fn new(grpc: G, rest: R) -> Self {
        Self { grpc, rest }
    }
}

/// Last path segment of a gRPC route, e.g. `GetExercise`.
fn rpc_method(path: &str) -> &'static str {
    let last = path.rsplit('/').next();
    Operation::ALL
        .into_iter()
        .map(|op| op.rpc_name())
        .find(|name| last == Some(*name))
        .unwrap_or("unknown")
}

impl<G, R, B, GB, RB> Service<Request<B>> for Multiplexer<G, R>
where
    G: Service<Request<B>, Response = Response<GB>, Error = Infallible> + Clone + Send + 'static,
    G::Future: Send + 'static,
    R: Service<Request<B>, Response = Response<RB>, Error = Infallible> + Clone + Send + 'static,
    R::Future: Send + 'static,
    GB: http_body::Body<Data = Bytes> + Send + 'static,
    GB::Error: Into<BoxError>,
    RB: http_body::Body<Data = Bytes> + Send + 'static,
    RB::Error: Into<BoxError>,
    B: Send + 'static,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Inner readiness is awaited per request by `oneshot`.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        match classify(request.version(), request.headers()) {
            Protocol::Grpc => {
                let grpc = self.grpc.clone();
                Box::pin(async move {
                    let start = Instant::now();
                    let method = rpc_method(request.uri().path());
                    let response = grpc.oneshot(request).await?;
                    // Set on trailers-only (error) responses; success codes travel in trailers.
                    let code = response
                        .headers()
                        .get("grpc-status")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("0")
                        .to_string();
                    metrics::record_request(Protocol::Grpc.as_str(), method, code, start);
                    Ok(response.map(Body::new))
                })
            }
            Protocol::Rest => {
                let rest = self.rest.clone();
                Box::pin(async move {
                    let response = rest.oneshot(request).await?;
                    Ok(response.map(Body::new))
                })
            }
        }
    }
}
