//! HTTP assembly for Faultline: the error pipeline, route guards and the
//! not-found fallback wired into an axum router

#![allow(clippy::must_use_candidate)]

mod error;
mod gate;
mod method_guard;
mod not_found;
mod pipeline;
mod sink;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{OriginalUri, Request};
use axum::middleware::Next;
use axum::response::IntoResponse;
use faultline_config::ServerConfig;
use faultline_core::ErrorHandler;
use faultline_supervisor::Supervisor;
use faultline_telemetry::ErrorMetrics;
use http::StatusCode;
use tower_http::trace::TraceLayer;

pub use error::RouteError;
pub use gate::TrustedErrorGate;
pub use method_guard::{allow_methods, method_guard};
pub use pipeline::{ErrorPipeline, ErrorStage, Flow, PipelineState, TranslatePersistence, error_pipeline_middleware};
pub use sink::ResponseSlot;

/// Assembled server with caller routes and the error-handling layers
pub struct Server {
    routes: Router,
    pipeline: ErrorPipeline,
    supervisor: Supervisor,
    metrics: ErrorMetrics,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Installs the health route when enabled and the standard error
    /// pipeline. Application routes are added with [`Server::merge`].
    ///
    /// # Errors
    ///
    /// Returns an error if the health method allow-list is invalid
    pub fn new(config: &ServerConfig, handler: ErrorHandler, supervisor: Supervisor) -> anyhow::Result<Self> {
        let mut routes = Router::new();

        if config.health.enabled {
            let methods = config.health.allowed_methods()?;
            let health = Router::new().route(&config.health.path, axum::routing::any(health_handler));
            routes = routes.merge(allow_methods(health, &methods));
        }

        Ok(Self {
            routes,
            pipeline: ErrorPipeline::standard(handler),
            supervisor,
            metrics: ErrorMetrics::new(),
            listen_address: config.listen_address(),
        })
    }

    /// Add application routes
    #[must_use]
    pub fn merge(mut self, routes: Router) -> Self {
        self.routes = self.routes.merge(routes);
        self
    }

    /// Replace the error pipeline
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: ErrorPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the assembled router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        let state = PipelineState {
            pipeline: Arc::new(self.pipeline),
            supervisor: self.supervisor,
            metrics: self.metrics.clone(),
        };
        let metrics = self.metrics;

        // Routes guarded by `allow_methods` keep their own method fallback
        self.routes
            .method_not_allowed_fallback({
                let metrics = metrics.clone();
                move |uri: OriginalUri| not_found::not_found(metrics, uri)
            })
            .fallback(move |uri: OriginalUri| not_found::not_found(metrics, uri))
            .layer(axum::middleware::from_fn(move |request: Request, next: Next| {
                let state = state.clone();
                async move { error_pipeline_middleware(state, request, next).await }
            }))
            .layer(TraceLayer::new_for_http())
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
