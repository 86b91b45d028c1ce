//! Security response headers and request path validation

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::types::ApiError;

/// Maximum buffered request body size (10 MB)
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
const SITE_CSP: &str = "default-src 'self'; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data:; \
     connect-src 'self'; \
     frame-ancestors 'none'";

/// Adds security headers to every response. API responses get a locked-down
/// CSP and `no-store` unless the handler set its own cache policy.
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let is_api_path = request.uri().path().starts_with("/api");
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    let csp = if is_api_path { API_CSP } else { SITE_CSP };
    headers.insert(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(csp));

    if is_api_path && !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        );
    }

    response
}

/// Rejects paths that try to escape the served tree
pub fn validate_request_security(path: &str) -> Result<(), SecurityValidationError> {
    if path.contains("..") || path.contains("//") {
        return Err(SecurityValidationError::PathTraversal);
    }

    if path.contains('\0') {
        return Err(SecurityValidationError::InvalidCharacters);
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub enum SecurityValidationError {
    PathTraversal,
    InvalidCharacters,
}

impl From<SecurityValidationError> for ApiError {
    fn from(err: SecurityValidationError) -> Self {
        let message = match err {
            SecurityValidationError::PathTraversal => "Invalid path: path traversal detected",
            SecurityValidationError::InvalidCharacters => {
                "Invalid request: prohibited characters"
            }
        };

        ApiError::bad_request(message).with_code("invalid_path")
    }
}

impl IntoResponse for SecurityValidationError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Status returned when a buffered body exceeds `MAX_BODY_SIZE`
pub fn payload_too_large() -> ApiError {
    ApiError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        crate::api::types::error::ApiErrorType::InvalidRequestError,
        format!("Request body too large (max: {} bytes)", MAX_BODY_SIZE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_validate_request_security_ok() {
        assert!(validate_request_security("/filings/AAPL").is_ok());
        assert!(validate_request_security("/api/analysis/business/business:AAPL:2023").is_ok());
    }

    #[test]
    fn test_validate_request_security_rejections() {
        assert_eq!(
            validate_request_security("/static/../secrets"),
            Err(SecurityValidationError::PathTraversal)
        );
        assert_eq!(
            validate_request_security("/static//index.html"),
            Err(SecurityValidationError::PathTraversal)
        );
        assert_eq!(
            validate_request_security("/index\0.html"),
            Err(SecurityValidationError::InvalidCharacters)
        );
    }

    #[test]
    fn test_rejection_is_bad_request() {
        let err = ApiError::from(SecurityValidationError::PathTraversal);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.code.as_deref(), Some("invalid_path"));
        assert_eq!(payload_too_large().status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    async fn headers_for(path: &str) -> axum::http::HeaderMap {
        let app = Router::new()
            .route("/api/x", get(|| async { "api" }))
            .route("/index.html", get(|| async { "site" }))
            .layer(middleware::from_fn(security_headers_middleware));

        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers().clone()
    }

    #[tokio::test]
    async fn test_api_responses_are_not_cacheable() {
        let headers = headers_for("/api/x").await;

        assert_eq!(headers.get(header::CONTENT_SECURITY_POLICY).unwrap(), API_CSP);
        assert!(headers
            .get(header::CACHE_CONTROL)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("no-store"));
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    }

    #[tokio::test]
    async fn test_site_responses_keep_cache_policy_open() {
        let headers = headers_for("/index.html").await;

        assert_eq!(headers.get(header::CONTENT_SECURITY_POLICY).unwrap(), SITE_CSP);
        assert!(headers.get(header::CACHE_CONTROL).is_none());
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    }
}
