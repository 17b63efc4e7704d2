//! Ratings on sets and collections.
//!
//! Endpoints:
//! - GET /ratings/{kind}/{id} - Average rating of a target
//! - POST /ratings/{kind}/{id} - Rate a target 1-5; returns the new average

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use shared::api::{RatePayload, RatingResponse};
use uuid::Uuid;

use crate::{
    error::AppError, middleware::auth::AuthUser, ratings, state::AppState, targets::TargetRef,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{kind}/{id}", get(get_rating).post(rate))
}

#[debug_handler]
async fn rate(
    user: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(payload): Json<RatePayload>,
) -> Result<impl IntoResponse, AppError> {
    let target = TargetRef::parse(&kind, id)?;
    let average_rating = ratings::rate(&state.repos, user.id, target, payload.score).await?;

    Ok(Json(RatingResponse { average_rating }))
}

#[debug_handler]
async fn get_rating(
    _user: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let target = TargetRef::parse(&kind, id)?;
    let average_rating = ratings::average_for(&state.repos, target).await?;

    Ok(Json(RatingResponse { average_rating }))
}
