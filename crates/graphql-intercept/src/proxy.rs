//! Forwarding of requests to the upstream GraphQL endpoint.
//!
//! The interception filter only observes traffic; this module supplies the
//! rest of the processing chain by relaying requests to the configured
//! upstream and copying the upstream response back to the client.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use http::header::{CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use reqwest::header::HeaderMap;
use tracing::debug;
use url::Url;

use crate::body::BufferedBody;
use crate::errors::ProxyError;

/// The upstream endpoint requests are forwarded to
#[derive(Clone)]
pub struct Upstream {
    client: reqwest::Client,
    endpoint: Url,
    headers: HeaderMap,
}

impl Upstream {
    /// Create an upstream from the endpoint URL and default headers attached
    /// to every forwarded request.
    pub fn new(endpoint: Url, headers: HeaderMap) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            headers,
        }
    }

    /// Resolve the upstream URL for a request path and query
    fn target(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(path);
        url.set_query(query);
        url
    }
}

/// Relay a request to the upstream endpoint and return its response verbatim.
pub async fn forward(
    State(upstream): State<Upstream>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let buffered = BufferedBody::capture(body).await?;

    let target = upstream.target(parts.uri.path(), parts.uri.query());
    debug!(method = %parts.method, %target, "Forwarding request upstream");

    let mut headers = parts.headers.clone();
    headers.remove(HOST);
    for (name, value) in upstream.headers.iter() {
        headers.insert(name.clone(), value.clone());
    }

    let upstream_response = upstream
        .client
        .request(parts.method, target)
        .headers(headers)
        .body(buffered.bytes())
        .send()
        .await?;

    let status = upstream_response.status();
    let mut response_headers = upstream_response.headers().clone();
    // The body is fully collected and re-framed, so drop the upstream framing
    // and encoding headers
    for name in [CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, TRANSFER_ENCODING] {
        response_headers.remove(name);
    }
    let body = upstream_response.bytes().await?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use reqwest::header::{HeaderName, HeaderValue};

    use super::*;

    fn request(body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/graphql")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_forward_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_body(r#"{"query":"query { a: 1 }"}"#)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"a":1}}"#)
            .create_async()
            .await;

        let upstream = Upstream::new(Url::parse(&server.url()).unwrap(), HeaderMap::new());
        let response = forward(State(upstream), request(r#"{"query":"query { a: 1 }"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), br#"{"data":{"a":1}}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forward_attaches_default_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("x-api-key", "secret")
            .with_status(200)
            .create_async()
            .await;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_static("secret"),
        );
        let upstream = Upstream::new(Url::parse(&server.url()).unwrap(), headers);
        let response = forward(State(upstream), request("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_upstream_maps_to_bad_gateway() {
        use axum::response::IntoResponse;

        // Bind an ephemeral port and drop the listener so the connection is
        // refused
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let upstream = Upstream::new(
            Url::parse(&format!("http://{address}")).unwrap(),
            HeaderMap::new(),
        );
        let error = forward(State(upstream), request("{}")).await.unwrap_err();

        assert!(matches!(error, ProxyError::Upstream(_)));
        assert_eq!(error.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_forward_relays_upstream_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let upstream = Upstream::new(Url::parse(&server.url()).unwrap(), HeaderMap::new());
        let response = forward(State(upstream), request("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_target_preserves_path_and_query() {
        let upstream = Upstream::new(
            Url::parse("http://127.0.0.1:4000").unwrap(),
            HeaderMap::new(),
        );
        let target = upstream.target("/api/graphql", Some("debug=1"));
        assert_eq!(target.as_str(), "http://127.0.0.1:4000/api/graphql?debug=1");
    }
}
