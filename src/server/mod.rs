//! HTTP front end for the fetch service
//!
//! Routes:
//! - `POST /fetch` submit a batch (admission limited per client)
//! - `GET /fetch` snapshot of all results
//! - `GET /health` liveness
//! - `GET /stats` limiter, fetch, and cleanup statistics
//! - `POST /admin/clear` drop every stored result

mod error;
mod handlers;

pub use error::{ApiError, ErrorBody, RATE_LIMIT_LIMIT, RATE_LIMIT_WINDOW};
pub use handlers::{client_key, FetchRequest, StatsResponse, SubmitResponse};

use crate::config::Config;
use crate::service::FetchService;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FetchService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(service: Arc<FetchService>, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}

/// Builds the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/fetch",
            post(handlers::submit_handler).get(handlers::results_handler),
        )
        .route("/health", get(handlers::health_handler))
        .route("/stats", get(handlers::stats_handler))
        .route("/admin/clear", post(handlers::clear_handler))
        .with_state(state)
}

/// Serves the router on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Fetch service listening on {}", addr);
    }

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
