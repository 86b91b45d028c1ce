//! reqwest-backed fetcher forwarding requests to the origin

use async_trait::async_trait;
use axum::http::header;
use reqwest::{redirect, Client};
use tracing::debug;

use crate::domain::edge::{strip_hop_by_hop, EdgeRequest, EdgeResponse, Fetcher};
use crate::domain::DomainError;

/// Forwards edge requests to a fixed origin.
///
/// Redirects are relayed to the caller as-is, never followed.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    origin_url: String,
}

impl HttpFetcher {
    pub fn new(origin_url: impl Into<String>) -> Result<Self, DomainError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, origin_url))
    }

    pub fn with_client(client: Client, origin_url: impl Into<String>) -> Self {
        let origin_url = origin_url.into().trim_end_matches('/').to_string();
        Self { client, origin_url }
    }

    pub fn origin_url(&self) -> &str {
        &self.origin_url
    }

    fn target_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.origin_url, path_and_query)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: EdgeRequest) -> Result<EdgeResponse, DomainError> {
        let target_url = self.target_url(&request.path_and_query);

        // Copy headers (except host)
        let mut headers = request.headers;
        headers.remove(header::HOST);
        strip_hop_by_hop(&mut headers);

        let mut proxy_req = self
            .client
            .request(request.method, &target_url)
            .headers(headers);

        if !request.body.is_empty() {
            proxy_req = proxy_req.body(request.body);
        }

        let response = proxy_req.send().await.map_err(|e| {
            DomainError::upstream(format!("Request to {} failed: {}", target_url, e))
        })?;

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);
        let body = response.bytes().await.map_err(|e| {
            DomainError::upstream(format!("Reading response from {} failed: {}", target_url, e))
        })?;

        debug!(url = %target_url, status = %status, "Origin responded");

        Ok(EdgeResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Method, StatusCode};
    use wiremock::matchers::{body_string, header as header_matcher, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_origin_trailing_slash_is_trimmed() {
        let fetcher = HttpFetcher::new("http://origin:8080/").unwrap();
        assert_eq!(fetcher.origin_url(), "http://origin:8080");
        assert_eq!(
            fetcher.target_url("/a?b=1"),
            "http://origin:8080/a?b=1"
        );
    }

    #[tokio::test]
    async fn test_forwards_path_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/filings"))
            .and(query_param("ticker", "AAPL"))
            .and(header_matcher("x-client", "restnvest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_raw("<html>ok</html>", "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-client", "restnvest".parse().unwrap());
        headers.insert(header::HOST, "edge.local".parse().unwrap());

        let fetcher = HttpFetcher::new(server.uri()).unwrap();
        let response = fetcher
            .fetch(EdgeRequest::get("/filings?ticker=AAPL").with_headers(headers))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "<html>ok</html>");
        assert_eq!(
            response.headers.get(header::CONTENT_TYPE).unwrap(),
            "text/html"
        );
    }

    #[tokio::test]
    async fn test_forwards_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analysis/business"))
            .and(body_string("{\"a\":1}"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(server.uri()).unwrap();
        let response = fetcher
            .fetch(EdgeRequest::new(Method::POST, "/api/analysis/business").with_body("{\"a\":1}"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_redirects_are_relayed_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/lead"))
            .respond_with(ResponseTemplate::new(303).insert_header("location", "/thanks"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/thanks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("thanks page"))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("new page"))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(server.uri()).unwrap();

        let response = fetcher
            .fetch(EdgeRequest::new(Method::POST, "/api/lead").with_body("email=a@b.c"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.headers.get(header::LOCATION).unwrap(), "/thanks");
        assert!(response.body.is_empty());

        let response = fetcher.fetch(EdgeRequest::get("/old")).await.unwrap();
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.headers.get(header::LOCATION).unwrap(), "/new");
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(server.uri()).unwrap();
        let response = fetcher.fetch(EdgeRequest::get("/")).await.unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body, "down");
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_error() {
        let fetcher = HttpFetcher::new("http://127.0.0.1:1").unwrap();
        let err = fetcher.fetch(EdgeRequest::get("/")).await.unwrap_err();

        assert!(matches!(err, DomainError::Upstream { .. }));
        assert!(err.to_string().contains("http://127.0.0.1:1/"));
    }
}
