//! HTTP server mounting the interception filter in front of the upstream.

use std::net::SocketAddr;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::errors::ServerError;
use crate::intercept::{InterceptConfig, intercept_graphql};
use crate::proxy::{Upstream, forward};

/// A GraphQL interception proxy server
pub struct Server {
    listen_address: SocketAddr,
    upstream: Upstream,
    intercept: InterceptConfig,
}

impl Server {
    pub fn new(listen_address: SocketAddr, upstream: Upstream, intercept: InterceptConfig) -> Self {
        Self {
            listen_address,
            upstream,
            intercept,
        }
    }

    /// Assemble the router: every request is forwarded upstream, with the
    /// interception filter observing qualifying GraphQL requests on the way.
    pub fn router(upstream: Upstream, intercept: InterceptConfig) -> Router {
        Router::new()
            .fallback(forward)
            .with_state(upstream)
            .layer(axum::middleware::from_fn_with_state(
                intercept,
                intercept_graphql,
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until CTRL+C or SIGTERM
    pub async fn serve(self) -> Result<(), ServerError> {
        info!(address = %self.listen_address, "Starting GraphQL interception proxy");
        let router = Self::router(self.upstream, self.intercept);
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
