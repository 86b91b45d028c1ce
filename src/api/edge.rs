//! HTTP front of the edge proxy

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::HeaderValue,
    middleware,
    response::Response,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{
    logging_middleware, payload_too_large, validate_request_security, EDGE_SOURCE_HEADER,
    MAX_BODY_SIZE,
};
use super::types::ApiError;
use crate::domain::edge::{strip_hop_by_hop, EdgeRequest};
use crate::infrastructure::edge::{EdgeOutcome, NetworkFirst};

/// Every path except the proxy's own health routes goes through `NetworkFirst`.
///
/// Path checks and the body cap only guard requests that may be cached;
/// bypassed requests reach the origin untouched.
pub fn create_edge_router(edge: Arc<NetworkFirst>) -> Router {
    Router::new()
        .route("/_edge/health", get(health::health_check))
        .route("/_edge/live", get(health::live_check))
        .fallback(edge_handler)
        .with_state(edge)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

pub async fn edge_handler(
    State(edge): State<Arc<NetworkFirst>>,
    request: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);

    let mut edge_request = EdgeRequest {
        method: parts.method,
        path_and_query,
        headers,
        body: Bytes::new(),
    };

    let limit = if edge.is_bypassed(&edge_request) {
        usize::MAX
    } else {
        validate_request_security(parts.uri.path())?;
        MAX_BODY_SIZE
    };
    edge_request.body = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| payload_too_large())?;

    let outcome = edge.handle(edge_request).await?;

    Ok(into_response(outcome))
}

fn into_response(outcome: EdgeOutcome) -> Response {
    let EdgeOutcome { response, source } = outcome;

    let mut http = Response::new(Body::from(response.body));
    *http.status_mut() = response.status;
    *http.headers_mut() = response.headers;
    http.headers_mut()
        .insert(EDGE_SOURCE_HEADER, HeaderValue::from_static(source.as_str()));
    http
}
