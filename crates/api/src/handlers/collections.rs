//! Collections group existing flashcard sets.
//!
//! Endpoints:
//! - POST /collections - Create a collection (quota: collection)
//! - GET /collections/random - Any one collection
//! - GET /collections/{id} - Collection with its set ids and average rating
//! - DELETE /collections/{id} - Delete own collection
//! - POST /collections/{id}/sets/{set_id} - Add a set to own collection
//! - DELETE /collections/{id}/sets/{set_id} - Remove a set from own collection
//! - GET /users/{id}/collections - Collections created by a user

use std::collections::HashSet;

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use garde::Validate;
use shared::api::{CollectionDetail, CreateCollectionPayload, CreatedResponse};
use uuid::Uuid;

use crate::{
    error::AppError, middleware::auth::AuthUser, models::Collection, quota::QuotaKind, ratings,
    state::AppState, targets::TargetRef,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_collection))
        .route("/random", get(random_collection))
        .route("/{id}", get(get_collection).delete(delete_collection))
        .route(
            "/{id}/sets/{set_id}",
            post(add_set_to_collection).delete(remove_set_from_collection),
        )
}

pub fn user_router() -> Router<AppState> {
    Router::new().route("/{id}/collections", get(list_user_collections))
}

async fn collection_detail(
    state: &AppState,
    collection: Collection,
) -> Result<CollectionDetail, AppError> {
    let set_ids = state.repos.collections.set_ids(collection.id).await?;
    let average_rating =
        ratings::average_rating(&state.repos, TargetRef::Collection(collection.id)).await?;

    Ok(CollectionDetail {
        id: collection.id,
        name: collection.name,
        description: collection.description,
        author_id: collection.author_id,
        set_ids,
        average_rating,
        created_at: collection.created_at,
    })
}

#[debug_handler]
async fn create_collection(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCollectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut seen = HashSet::new();
    let set_ids: Vec<Uuid> = payload
        .set_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    let existing: HashSet<Uuid> = state
        .repos
        .sets
        .find_existing(&set_ids)
        .await?
        .into_iter()
        .collect();
    let unknown: Vec<String> = set_ids
        .iter()
        .filter(|id| !existing.contains(id))
        .map(Uuid::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::Validation(format!(
            "unknown set ids: {}",
            unknown.join(", ")
        )));
    }

    let admitted = state
        .limiter
        .create_within_quota(user.quota_subject(), QuotaKind::Collection, async {
            state
                .repos
                .collections
                .create(user.id, &payload.name, payload.description.clone(), &set_ids)
                .await
                .map_err(AppError::from)
        })
        .await?;

    tracing::info!(
        user_id = %user.id,
        collection_id = %admitted.value.id,
        sets = set_ids.len(),
        "collection created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: admitted.value.id,
            warning: admitted.warning,
        }),
    ))
}

#[debug_handler]
async fn get_collection(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let collection = state
        .repos
        .collections
        .find_by_id(id)
        .await?
        .ok_or(AppError::External(
            StatusCode::NOT_FOUND,
            "Collection not found",
        ))?;

    Ok(Json(collection_detail(&state, collection).await?))
}

/// Someone else's collection looks the same as a missing one.
async fn ensure_owned(state: &AppState, user: &AuthUser, id: Uuid) -> Result<(), AppError> {
    let owned = state
        .repos
        .collections
        .find_by_id(id)
        .await?
        .is_some_and(|c| c.author_id == Some(user.id));

    if owned {
        Ok(())
    } else {
        Err(AppError::External(
            StatusCode::NOT_FOUND,
            "Collection not found",
        ))
    }
}

#[debug_handler]
async fn random_collection(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let collection = state
        .repos
        .collections
        .random()
        .await?
        .ok_or(AppError::External(
            StatusCode::NOT_FOUND,
            "There are no flashcard set collections",
        ))?;

    Ok(Json(collection_detail(&state, collection).await?))
}

#[debug_handler]
async fn delete_collection(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owned(&state, &user, id).await?;

    if state.repos.collections.delete(id).await? {
        tracing::info!(user_id = %user.id, collection_id = %id, "collection deleted");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler]
async fn add_set_to_collection(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, set_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owned(&state, &user, id).await?;
    if state.repos.sets.find_by_id(set_id).await?.is_none() {
        return Err(AppError::External(StatusCode::NOT_FOUND, "Set not found"));
    }

    if state.repos.collections.add_set(id, set_id).await? {
        tracing::info!(user_id = %user.id, collection_id = %id, %set_id, "set added to collection");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Removing a set that was never in the collection is a no-op.
#[debug_handler]
async fn remove_set_from_collection(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, set_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owned(&state, &user, id).await?;

    if state.repos.collections.remove_set(id, set_id).await? {
        tracing::info!(
            user_id = %user.id,
            collection_id = %id,
            %set_id,
            "set removed from collection"
        );
    }

    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler]
async fn list_user_collections(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(author_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let collections = state.repos.collections.list_by_author(author_id).await?;

    let mut result = Vec::with_capacity(collections.len());
    for collection in collections {
        result.push(collection_detail(&state, collection).await?);
    }

    Ok(Json(result))
}
