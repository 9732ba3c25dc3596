//! Health and Metrics Server - Liveness, Readiness, Prometheus
//!
//! Exposes /live, /ready and /metrics via axum 0.7. /ready returns 503
//! until the first cycle has completed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use super::prometheus::MetricsRegistry;
use crate::domain::target::RebalanceOutcome;
use crate::ports::cycle_observer::CycleObserver;

/// Shared health state polled by readiness probes.
#[derive(Debug, Default)]
pub struct HealthState {
    /// Set after the first cycle completes.
    first_cycle_done: AtomicBool,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a cycle ran to completion.
    pub fn mark_cycle_complete(&self) {
        self.first_cycle_done.store(true, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.first_cycle_done.load(Ordering::Relaxed)
    }
}

impl CycleObserver for HealthState {
    fn cycle_finished(&self, _outcomes: &[RebalanceOutcome], _finished_at: i64) {
        self.mark_cycle_complete();
    }
}

#[derive(Clone)]
struct ServerState {
    health: Arc<HealthState>,
    metrics: Arc<MetricsRegistry>,
}

/// Axum-based health and metrics HTTP server.
pub struct HealthServer {
    health: Arc<HealthState>,
    metrics: Arc<MetricsRegistry>,
    bind_address: String,
}

impl HealthServer {
    pub fn new(
        health: Arc<HealthState>,
        metrics: Arc<MetricsRegistry>,
        bind_address: String,
    ) -> Self {
        Self {
            health,
            metrics,
            bind_address,
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .route("/metrics", get(Self::metrics))
            .with_state(ServerState {
                health: Arc::clone(&self.health),
                metrics: Arc::clone(&self.metrics),
            })
    }

    /// Serve until `shutdown_rx` fires.
    #[instrument(skip(self, shutdown_rx), fields(address = %self.bind_address))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        info!("Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: 200 once a cycle has completed.
    async fn readiness(State(state): State<ServerState>) -> impl IntoResponse {
        if state.health.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }

    async fn metrics(State(state): State<ServerState>) -> impl IntoResponse {
        match state.metrics.encode() {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => {
                warn!(error = %e, "Failed to encode metrics");
                (StatusCode::INTERNAL_SERVER_ERROR, String::new())
            }
        }
    }
}
