//! Health check endpoint for load balancers and monitoring.
//!
//! Returns 200 OK if the service is healthy (database and quota ledger
//! reachable), 503 Service Unavailable otherwise.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;
use shared::api::VersionResponse;

use crate::{config::LedgerBackend, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

pub fn version_router() -> Router<AppState> {
    Router::new().route("/", get(version))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
    ledger: bool,
    ledger_backend: LedgerBackend,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.repos.status.health_check().await.unwrap_or(false);
    let ledger_ok = state.limiter.ledger_healthy().await;

    let healthy = db_ok && ledger_ok;

    let response = HealthResponse {
        status: if healthy { "ok" } else { "unhealthy" },
        database: db_ok,
        ledger: ledger_ok,
        ledger_backend: state.config.ledger_backend,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
