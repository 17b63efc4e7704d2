//! Admin-only quota policy management.
//!
//! Endpoints:
//! - GET /admin/quota-policy - Current per-day limits
//! - PUT /admin/quota-policy - Replace the per-day limits (0 = unlimited)

use axum::{
    Json, Router, debug_handler, extract::State, http::StatusCode, response::IntoResponse,
    routing::get,
};
use garde::Validate;
use shared::api::QuotaPolicyPayload;

use crate::{error::AppError, middleware::auth::AuthUser, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/quota-policy", get(get_policy).put(update_policy))
}

fn require_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin {
        return Err(AppError::External(
            StatusCode::FORBIDDEN,
            "Admin access required",
        ));
    }
    Ok(())
}

#[debug_handler]
async fn get_policy(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&user)?;

    let policy = state.policy.get_policy().await?;

    Ok(Json(QuotaPolicyPayload::from(policy)))
}

#[debug_handler]
async fn update_policy(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<QuotaPolicyPayload>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let stored = state.policy.set_policy(payload.into()).await?;

    tracing::info!(user_id = %user.id, "quota policy changed by admin");

    Ok(Json(QuotaPolicyPayload::from(stored)))
}
