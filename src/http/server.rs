//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the demo handler
//! - Wire up middleware (gate, timeout, request ID, tracing)
//! - Bind server to listener, shut down gracefully on signal

use std::net::SocketAddr;
use std::time::Duration;

use axum::{routing::get, Extension, Json, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::RequestContext;
use crate::config::GatekeeperConfig;
use crate::http::gate::Gate;
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};

/// HTTP server exposing gated routes.
pub struct GatekeeperServer {
    router: Router,
    config: GatekeeperConfig,
}

impl GatekeeperServer {
    /// Create a server whose routes sit behind `gate`.
    pub fn new(config: GatekeeperConfig, gate: Gate) -> Self {
        let router = Self::build_router(&config, &gate, app_routes());
        Self { router, config }
    }

    /// Build the router with all middleware layers around `routes`.
    #[allow(deprecated)]
    pub fn build_router(config: &GatekeeperConfig, gate: &Gate, routes: Router) -> Router {
        gate.apply(routes)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }
}

/// Routes served by the binary: they only echo what the gate resolved.
pub fn app_routes() -> Router {
    Router::new()
        .route("/", get(whoami))
        .route("/whoami", get(whoami))
}

async fn whoami(Extension(ctx): Extension<RequestContext>) -> Json<RequestContext> {
    Json(ctx)
}
