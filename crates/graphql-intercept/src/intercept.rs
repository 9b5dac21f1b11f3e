//! Request interception for GraphQL endpoints.
//!
//! The filter watches for POST requests to the GraphQL path, buffers the
//! request body so downstream handlers can still read it, and logs the
//! extracted operation content along with an approximate batch size. All
//! other requests pass through untouched.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::Method;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use crate::body::BufferedBody;
use crate::errors::InterceptError;
use crate::operation::{count_top_level_pairs, extract_operation_content};

/// Interception filter options
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct InterceptConfig {
    /// POST requests are intercepted when their path ends with this suffix
    pub path_suffix: String,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            path_suffix: "/graphql".to_string(),
        }
    }
}

impl InterceptConfig {
    /// Whether the filter applies to a request
    fn applies_to(&self, method: &Method, path: &str) -> bool {
        method == Method::POST && path.ends_with(&self.path_suffix)
    }
}

/// Log the operation content and batch size of GraphQL requests, leaving the
/// request body readable for the rest of the chain.
///
/// The request body is captured once and replayed downstream; the response
/// body is captured and copied back verbatim. A request whose body contains
/// no recognizable operation is passed through without logging.
pub async fn intercept_graphql(
    State(config): State<InterceptConfig>,
    request: Request,
    next: Next,
) -> Result<Response, InterceptError> {
    if !config.applies_to(request.method(), request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let buffered = BufferedBody::capture(body).await?;

    let text = buffered.as_text();
    if let Some(content) = extract_operation_content(&text) {
        info!("Operation content: {content}");
        if !content.is_empty() {
            info!("Batch size: {}", count_top_level_pairs(content));
        }
    }

    let request = Request::from_parts(parts, buffered.replay());
    let response = next.run(request).await;

    // Collect the response body and copy it back verbatim, mirroring the
    // request-side buffering. Streaming responses are fully collected here.
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(InterceptError::ResponseBodyRead)?;
    Ok(Response::from_parts(parts, Body::from(bytes)))
}
