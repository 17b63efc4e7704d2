//! Favorite sets.
//!
//! Endpoints:
//! - POST /favorites/toggle - Add or remove a favorite (`{"type": "set", "id": ...}`)
//! - GET /favorites - The caller's favorite sets

use axum::{
    Json, Router, debug_handler,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use garde::Validate;
use shared::api::{SetSummary, ToggleFavoritePayload, ToggleFavoriteResponse};

use crate::{error::AppError, favorites, middleware::auth::AuthUser, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites))
        .route("/toggle", post(toggle))
}

#[debug_handler]
async fn toggle(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ToggleFavoritePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let favorited =
        favorites::toggle_favorite(&state.repos, user.id, &payload.kind, payload.id).await?;

    Ok(Json(ToggleFavoriteResponse { favorited }))
}

#[debug_handler]
async fn list_favorites(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let sets: Vec<SetSummary> = state
        .repos
        .favorites
        .list_sets(user.id)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::MockSetRepo;
    use crate::test_utils::{MemoryFavoriteRepo, TestStateBuilder, mock_set, response_json};
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            is_admin: false,
        }
    }

    fn toggle_payload(kind: &str, id: Uuid) -> ToggleFavoritePayload {
        ToggleFavoritePayload {
            kind: kind.to_string(),
            id,
        }
    }

    #[tokio::test]
    async fn toggle_then_list() {
        let caller = user();
        let set = mock_set(Uuid::new_v4());
        let set_id = set.id;
        let mut sets = MockSetRepo::new();
        sets.expect_find_by_id()
            .returning(move |_| Ok(Some(set.clone())));
        let state = TestStateBuilder::new()
            .with_set_repo(sets)
            .with_favorite_repo(MemoryFavoriteRepo::default())
            .build();

        let response = toggle(caller, State(state.clone()), Json(toggle_payload("set", set_id)))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response_json(response).await["favorited"], true);

        let response = list_favorites(caller, State(state.clone()))
            .await
            .unwrap()
            .into_response();
        let body = response_json(response).await;
        assert_eq!(body[0]["id"], set_id.to_string());

        let response = toggle(caller, State(state), Json(toggle_payload("set", set_id)))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response_json(response).await["favorited"], false);
    }

    #[tokio::test]
    async fn collection_type_is_400() {
        let state = TestStateBuilder::new().build();

        let result = toggle(user(), State(state), Json(toggle_payload("collection", Uuid::new_v4()))).await;

        let Err(err) = result else { panic!("expected error") };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_type_is_400() {
        let state = TestStateBuilder::new().build();

        let result = toggle(user(), State(state), Json(toggle_payload("", Uuid::new_v4()))).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
