// rest/routes/health.rs — liveness and store-connectivity probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::AppContext;

/// Pure liveness: no store round-trip.
pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": ctx.started_at.elapsed().as_secs(),
        "environment": ctx.config.environment,
    }))
}

/// Liveness plus a database probe. 503 when the store is unreachable.
pub async fn health_detailed(State(ctx): State<Arc<AppContext>>) -> (StatusCode, Json<Value>) {
    let start = std::time::Instant::now();
    let probe = ctx.store.ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match probe {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "uptime_secs": ctx.started_at.elapsed().as_secs(),
                "environment": ctx.config.environment,
                "checks": {
                    "database": { "status": "ok", "latency_ms": latency_ms }
                }
            })),
        ),
        Err(e) => {
            warn!(err = %format!("{e:#}"), "database health probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "checks": {
                        "database": { "status": "critical", "message": format!("{e:#}") }
                    }
                })),
            )
        }
    }
}
