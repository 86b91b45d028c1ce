//! Buffered HTTP request/response values handled by the edge proxy

use axum::http::{header, HeaderMap, Method, StatusCode};
use bytes::Bytes;

/// A buffered request on its way to the origin
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    pub method: Method,
    /// Path plus optional query string, e.g. `/filings?ticker=AAPL`
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl EdgeRequest {
    pub fn new(method: Method, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(path_and_query: impl Into<String>) -> Self {
        Self::new(Method::GET, path_and_query)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Path without the query string
    pub fn path(&self) -> &str {
        self.path_and_query
            .split_once('?')
            .map_or(self.path_and_query.as_str(), |(path, _)| path)
    }

    /// Identity used to match this request against stored responses
    pub fn key(&self) -> RequestKey {
        RequestKey {
            method: self.method.clone(),
            path_and_query: self.path_and_query.clone(),
        }
    }
}

/// Exact-request identity: method plus path and query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: Method,
    pub path_and_query: String,
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path_and_query)
    }
}

/// A fully buffered response
#[derive(Debug, Clone)]
pub struct EdgeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl EdgeResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

/// Removes connection-scoped headers that must not be replayed on a
/// re-buffered message.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in [
        header::CONNECTION,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
        header::TE,
        header::TRAILER,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
    ] {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_strips_query() {
        let request = EdgeRequest::get("/filings?ticker=AAPL");
        assert_eq!(request.path(), "/filings");

        let request = EdgeRequest::get("/about");
        assert_eq!(request.path(), "/about");
    }

    #[test]
    fn test_request_key_distinguishes_query_and_method() {
        let a = EdgeRequest::get("/filings?ticker=AAPL").key();
        let b = EdgeRequest::get("/filings?ticker=MSFT").key();
        let c = EdgeRequest::new(Method::HEAD, "/filings?ticker=AAPL").key();

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, EdgeRequest::get("/filings?ticker=AAPL").key());
        assert_eq!(a.to_string(), "GET /filings?ticker=AAPL");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::TRANSFER_ENCODING, "chunked".parse().unwrap());
        headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
        headers.insert("keep-alive", "timeout=5".parse().unwrap());
        headers.insert(header::CONTENT_TYPE, "text/html".parse().unwrap());

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }
}
