//! Flashcard sets and the cards inside them.
//!
//! Creating a set or a card counts against the caller's daily quota.
//!
//! Endpoints:
//! - POST /sets - Create a set (quota: set)
//! - GET /sets/{id} - Set with tags, card count and average rating
//! - PUT /sets/{id} - Rename and retag (author or admin)
//! - DELETE /sets/{id} - Delete with cards, comments, ratings and favorites (author only)
//! - GET /sets/{id}/cards - Cards in a set
//! - POST /sets/{id}/cards - Add a card (set author only, quota: flashcard)
//! - GET /sets/{id}/cards/{card_id} - One card
//! - PUT /sets/{id}/cards/{card_id} - Replace a card (set author or admin)
//! - DELETE /sets/{id}/cards/{card_id} - Delete a card (set author or admin)
//! - GET /users/{id}/sets - Sets created by a user

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use garde::Validate;
use shared::api::{
    CardInfo, CardPayload, CreatedResponse, SetDetail, SetPayload, SetSummary, normalize_tags,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::{Flashcard, FlashcardSet},
    quota::QuotaKind,
    ratings,
    state::AppState,
    targets::TargetRef,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_set))
        .route("/{id}", get(get_set).put(update_set).delete(delete_set))
        .route("/{id}/cards", get(list_cards).post(create_card))
        .route(
            "/{id}/cards/{card_id}",
            get(get_card).put(update_card).delete(delete_card),
        )
}

pub fn user_router() -> Router<AppState> {
    Router::new().route("/{id}/sets", get(list_user_sets))
}

async fn find_set(state: &AppState, id: Uuid) -> Result<FlashcardSet, AppError> {
    state
        .repos
        .sets
        .find_by_id(id)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Set not found"))
}

/// A card in `set_id`. Cards of other sets read as missing.
async fn find_card(state: &AppState, set_id: Uuid, card_id: Uuid) -> Result<Flashcard, AppError> {
    state
        .repos
        .cards
        .find_by_id(card_id)
        .await?
        .filter(|c| c.set_id == set_id)
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Card not found"))
}

fn can_edit(user: &AuthUser, set: &FlashcardSet) -> bool {
    set.author_id == user.id || user.is_admin
}

fn card_info(c: Flashcard) -> CardInfo {
    CardInfo {
        id: c.id,
        question: c.question,
        answer: c.answer,
        difficulty: c.difficulty.map(Into::into),
        created_at: c.created_at,
    }
}

#[debug_handler]
async fn create_set(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SetPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tags = normalize_tags(&payload.tags);

    let admitted = state
        .limiter
        .create_within_quota(user.quota_subject(), QuotaKind::Set, async {
            state
                .repos
                .sets
                .create(user.id, &payload.name, &tags)
                .await
                .map_err(AppError::from)
        })
        .await?;

    tracing::info!(user_id = %user.id, set_id = %admitted.value.id, "set created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: admitted.value.id,
            warning: admitted.warning,
        }),
    ))
}

#[debug_handler]
async fn get_set(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let set = find_set(&state, id).await?;

    let tags = state.repos.sets.tags_for(id).await?;
    let card_count = state.repos.cards.count_by_set(id).await?;
    let average_rating = ratings::average_rating(&state.repos, TargetRef::Set(id)).await?;

    Ok(Json(SetDetail {
        id: set.id,
        name: set.name,
        author_id: Some(set.author_id),
        tags,
        card_count,
        average_rating,
        created_at: set.created_at,
        updated_at: set.updated_at,
    }))
}

/// Only the author may edit a set; admins may edit any set.
#[debug_handler]
async fn update_set(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let set = find_set(&state, id).await?;
    if !can_edit(&user, &set) {
        return Err(AppError::External(
            StatusCode::FORBIDDEN,
            "You do not own this set",
        ));
    }

    let tags = normalize_tags(&payload.tags);
    state
        .repos
        .sets
        .update(id, &payload.name, &tags)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Set not found"))?;

    tracing::info!(user_id = %user.id, set_id = %id, "set updated");

    Ok(StatusCode::OK)
}

#[debug_handler]
async fn delete_set(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let set = find_set(&state, id).await?;
    if set.author_id != user.id {
        return Err(AppError::External(
            StatusCode::FORBIDDEN,
            "You do not own this set",
        ));
    }

    if state.repos.sets.delete(id).await? {
        tracing::info!(user_id = %user.id, set_id = %id, "set deleted");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler]
async fn list_cards(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    find_set(&state, id).await?;

    let cards: Vec<CardInfo> = state
        .repos
        .cards
        .list_by_set(id)
        .await?
        .into_iter()
        .map(card_info)
        .collect();

    Ok(Json(cards))
}

#[debug_handler]
async fn create_card(
    user: AuthUser,
    State(state): State<AppState>,
    Path(set_id): Path<Uuid>,
    Json(payload): Json<CardPayload>,
) -> Result<impl IntoResponse, AppError> {
    let set = find_set(&state, set_id).await?;
    if set.author_id != user.id {
        return Err(AppError::External(
            StatusCode::FORBIDDEN,
            "You do not own this set",
        ));
    }

    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let admitted = state
        .limiter
        .create_within_quota(user.quota_subject(), QuotaKind::Card, async {
            state
                .repos
                .cards
                .create(
                    set_id,
                    &payload.question,
                    &payload.answer,
                    payload.difficulty.map(Into::into),
                )
                .await
                .map_err(AppError::from)
        })
        .await?;

    tracing::info!(user_id = %user.id, %set_id, card_id = %admitted.value.id, "card created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: admitted.value.id,
            warning: admitted.warning,
        }),
    ))
}

#[debug_handler]
async fn get_card(
    _user: AuthUser,
    State(state): State<AppState>,
    Path((set_id, card_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    find_set(&state, set_id).await?;
    let card = find_card(&state, set_id, card_id).await?;

    Ok(Json(card_info(card)))
}

#[debug_handler]
async fn update_card(
    user: AuthUser,
    State(state): State<AppState>,
    Path((set_id, card_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CardPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let set = find_set(&state, set_id).await?;
    if !can_edit(&user, &set) {
        return Err(AppError::External(
            StatusCode::FORBIDDEN,
            "You do not own this set",
        ));
    }
    find_card(&state, set_id, card_id).await?;

    let card = state
        .repos
        .cards
        .update(
            card_id,
            &payload.question,
            &payload.answer,
            payload.difficulty.map(Into::into),
        )
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Card not found"))?;

    tracing::info!(user_id = %user.id, %set_id, %card_id, "card updated");

    Ok(Json(card_info(card)))
}

#[debug_handler]
async fn delete_card(
    user: AuthUser,
    State(state): State<AppState>,
    Path((set_id, card_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let set = find_set(&state, set_id).await?;
    if !can_edit(&user, &set) {
        return Err(AppError::External(
            StatusCode::FORBIDDEN,
            "You do not own this set",
        ));
    }
    find_card(&state, set_id, card_id).await?;

    if state.repos.cards.delete(card_id).await? {
        tracing::info!(user_id = %user.id, %set_id, %card_id, "card deleted");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler]
async fn list_user_sets(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(author_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sets: Vec<SetSummary> = state
        .repos
        .sets
        .list_by_author(author_id)
        .await?
        .into_iter()
        .map(|s| SetSummary {
            id: s.id,
            name: s.name,
            author_id: Some(s.author_id),
            created_at: s.created_at,
        })
        .collect();

    Ok(Json(sets))
}
