use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// An error raised while intercepting a request
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    #[error("Failed to read request body: {0}")]
    RequestBodyRead(#[source] axum::Error),

    #[error("Failed to read response body: {0}")]
    ResponseBodyRead(#[source] axum::Error),
}

impl IntoResponse for InterceptError {
    fn into_response(self) -> Response {
        let status = match &self {
            InterceptError::RequestBodyRead(_) => StatusCode::BAD_REQUEST,
            InterceptError::ResponseBodyRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// An error in server startup
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Could not serve on the listen address: {0}")]
    Io(#[from] std::io::Error),
}

/// An error forwarding a request to the upstream endpoint
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Failed to send request to upstream endpoint: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error(transparent)]
    Intercept(#[from] InterceptError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::Upstream(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string()).into_response()
            }
            ProxyError::Intercept(error) => error.into_response(),
        }
    }
}
