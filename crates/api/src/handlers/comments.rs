//! Comments on sets and collections.
//!
//! Endpoints:
//! - GET /comments/{kind}/{id} - Comments on a target, newest first
//! - POST /comments/{kind}/{id} - Comment on a target
//! - PUT /comments/{id} - Edit a comment (author or admin)
//! - DELETE /comments/{id} - Delete a comment (author or admin)

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use garde::Validate;
use shared::api::{CommentInfo, CommentPayload};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::Comment,
    state::AppState,
    targets::{self, TargetRef},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{kind}/{id}", get(list_comments).post(create_comment))
        .route("/{id}", put(update_comment).delete(delete_comment))
}

fn to_info(c: Comment) -> CommentInfo {
    CommentInfo {
        id: c.id,
        author_id: c.author_id,
        body: c.body,
        created_at: c.created_at,
    }
}

/// Loads a comment the caller may change.
async fn editable_comment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> Result<Comment, AppError> {
    let comment = state
        .repos
        .comments
        .find_by_id(id)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Comment not found"))?;

    if comment.author_id != Some(user.id) && !user.is_admin {
        return Err(AppError::External(
            StatusCode::FORBIDDEN,
            "You do not own this comment",
        ));
    }

    Ok(comment)
}

#[debug_handler]
async fn create_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(payload): Json<CommentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let target = TargetRef::parse(&kind, id)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let target = targets::resolve(&state.repos, target).await?.target_ref();
    let comment = state
        .repos
        .comments
        .create(user.id, target, &payload.body)
        .await?;

    tracing::info!(
        user_id = %user.id,
        target_kind = %target.kind(),
        target_id = %target.id(),
        comment_id = %comment.id,
        "comment created"
    );

    Ok((StatusCode::CREATED, Json(to_info(comment))))
}

#[debug_handler]
async fn list_comments(
    _user: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let target = TargetRef::parse(&kind, id)?;
    let target = targets::resolve(&state.repos, target).await?.target_ref();

    let comments: Vec<CommentInfo> = state
        .repos
        .comments
        .list_for(target)
        .await?
        .into_iter()
        .map(to_info)
        .collect();

    Ok(Json(comments))
}

#[debug_handler]
async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    editable_comment(&state, &user, id).await?;

    let comment = state
        .repos
        .comments
        .update_body(id, &payload.body)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Comment not found"))?;

    tracing::info!(user_id = %user.id, comment_id = %id, "comment edited");

    Ok(Json(to_info(comment)))
}

#[debug_handler]
async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    editable_comment(&state, &user, id).await?;

    if state.repos.comments.delete(id).await? {
        tracing::info!(user_id = %user.id, comment_id = %id, "comment deleted");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::{MockCollectionRepo, MockCommentRepo, MockSetRepo};
    use crate::test_utils::{TestStateBuilder, mock_collection, mock_comment, mock_set, response_json};
    use mockall::predicate::eq;

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            is_admin: false,
        }
    }

    fn body(text: &str) -> CommentPayload {
        CommentPayload {
            body: text.to_string(),
        }
    }

    #[tokio::test]
    async fn comments_on_collection() {
        let caller = user();
        let collection = mock_collection(None);
        let id = collection.id;
        let mut collections = MockCollectionRepo::new();
        collections
            .expect_find_by_id()
            .returning(move |_| Ok(Some(collection.clone())));
        let mut comments = MockCommentRepo::new();
        comments
            .expect_create()
            .withf(move |author, target, body| {
                *author == caller.id && *target == TargetRef::Collection(id) && body == "Nice"
            })
            .returning(|author, target, _| Ok(mock_comment(author, target)));
        let state = TestStateBuilder::new()
            .with_collection_repo(collections)
            .with_comment_repo(comments)
            .build();

        let response = create_comment(
            caller,
            State(state),
            Path(("collection".to_string(), id)),
            Json(body("Nice")),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn unknown_kind_is_400() {
        let mut comments = MockCommentRepo::new();
        comments.expect_create().never();
        let state = TestStateBuilder::new().with_comment_repo(comments).build();

        let result = create_comment(
            user(),
            State(state),
            Path(("card".to_string(), Uuid::new_v4())),
            Json(body("Hello")),
        )
        .await;

        let Err(AppError::Validation(msg)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(msg, "invalid type");
    }

    #[tokio::test]
    async fn comment_on_missing_set_is_404() {
        let mut sets = MockSetRepo::new();
        sets.expect_find_by_id().returning(|_| Ok(None));
        let mut comments = MockCommentRepo::new();
        comments.expect_create().never();
        let state = TestStateBuilder::new()
            .with_set_repo(sets)
            .with_comment_repo(comments)
            .build();

        let result = create_comment(
            user(),
            State(state),
            Path(("set".to_string(), Uuid::new_v4())),
            Json(body("Hello")),
        )
        .await;

        let Err(err) = result else { panic!("expected error") };
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let state = TestStateBuilder::new().build();

        let result = create_comment(
            user(),
            State(state),
            Path(("set".to_string(), Uuid::new_v4())),
            Json(body("")),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn lists_comments_for_set() {
        let set = mock_set(Uuid::new_v4());
        let set_id = set.id;
        let mut sets = MockSetRepo::new();
        sets.expect_find_by_id()
            .returning(move |_| Ok(Some(set.clone())));
        let mut comments = MockCommentRepo::new();
        comments
            .expect_list_for()
            .with(eq(TargetRef::Set(set_id)))
            .returning(|target| {
                Ok(vec![
                    mock_comment(Uuid::new_v4(), target),
                    mock_comment(Uuid::new_v4(), target),
                ])
            });
        let state = TestStateBuilder::new()
            .with_set_repo(sets)
            .with_comment_repo(comments)
            .build();

        let response = list_comments(user(), State(state), Path(("set".to_string(), set_id)))
            .await
            .unwrap()
            .into_response();

        let body = response_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["body"], "Great set!");
    }

    mod edit {
        use super::*;

        fn existing(author: Uuid) -> (MockCommentRepo, Uuid) {
            let comment = mock_comment(author, TargetRef::Set(Uuid::new_v4()));
            let id = comment.id;
            let mut comments = MockCommentRepo::new();
            comments
                .expect_find_by_id()
                .with(eq(id))
                .returning(move |_| Ok(Some(comment.clone())));
            (comments, id)
        }

        fn rewriting(comments: &mut MockCommentRepo, author: Uuid) {
            comments
                .expect_update_body()
                .times(1)
                .returning(move |id, body| {
                    let mut comment = mock_comment(author, TargetRef::Set(Uuid::new_v4()));
                    comment.id = id;
                    comment.body = body.to_string();
                    Ok(Some(comment))
                });
        }

        #[tokio::test]
        async fn author_edits_comment() {
            let caller = user();
            let (mut comments, id) = existing(caller.id);
            rewriting(&mut comments, caller.id);
            let state = TestStateBuilder::new().with_comment_repo(comments).build();

            let response = update_comment(caller, State(state), Path(id), Json(body("Edited")))
                .await
                .unwrap()
                .into_response();

            assert_eq!(response.status(), StatusCode::OK);
            let body = response_json(response).await;
            assert_eq!(body["id"], id.to_string());
            assert_eq!(body["body"], "Edited");
        }

        #[tokio::test]
        async fn admin_edits_any_comment() {
            let author = Uuid::new_v4();
            let (mut comments, id) = existing(author);
            rewriting(&mut comments, author);
            let state = TestStateBuilder::new().with_comment_repo(comments).build();
            let admin = AuthUser {
                id: Uuid::new_v4(),
                is_admin: true,
            };

            let response =
                update_comment(admin, State(state), Path(id), Json(body("Moderated")))
                    .await
                    .unwrap()
                    .into_response();

            let body = response_json(response).await;
            assert_eq!(body["author_id"], author.to_string());
        }

        #[tokio::test]
        async fn stranger_cannot_edit() {
            let (mut comments, id) = existing(Uuid::new_v4());
            comments.expect_update_body().never();
            let state = TestStateBuilder::new().with_comment_repo(comments).build();

            let result =
                update_comment(user(), State(state), Path(id), Json(body("Mine now"))).await;

            let Err(err) = result else { panic!("expected error") };
            assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
        }

        #[tokio::test]
        async fn editing_missing_comment_is_404() {
            let mut comments = MockCommentRepo::new();
            comments.expect_find_by_id().returning(|_| Ok(None));
            comments.expect_update_body().never();
            let state = TestStateBuilder::new().with_comment_repo(comments).build();

            let result =
                update_comment(user(), State(state), Path(Uuid::new_v4()), Json(body("Hi"))).await;

            let Err(err) = result else { panic!("expected error") };
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let body = response_json(response).await;
            assert_eq!(body["detail"], "Comment not found");
        }

        #[tokio::test]
        async fn overlong_edit_is_rejected() {
            let caller = user();
            let (mut comments, id) = existing(caller.id);
            comments.expect_update_body().never();
            let state = TestStateBuilder::new().with_comment_repo(comments).build();

            let long = body(&"a".repeat(1001));
            let result = update_comment(caller, State(state), Path(id), Json(long)).await;

            let Err(AppError::Validation(msg)) = result else {
                panic!("expected validation error");
            };
            assert!(msg.contains("Comment cannot exceed 1000 characters."));
        }

        #[tokio::test]
        async fn author_deletes_comment() {
            let caller = user();
            let (mut comments, id) = existing(caller.id);
            comments
                .expect_delete()
                .with(eq(id))
                .times(1)
                .returning(|_| Ok(true));
            let state = TestStateBuilder::new().with_comment_repo(comments).build();

            let response = delete_comment(caller, State(state), Path(id))
                .await
                .unwrap()
                .into_response();

            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        #[tokio::test]
        async fn stranger_cannot_delete() {
            let (mut comments, id) = existing(Uuid::new_v4());
            comments.expect_delete().never();
            let state = TestStateBuilder::new().with_comment_repo(comments).build();

            let result = delete_comment(user(), State(state), Path(id)).await;

            let Err(err) = result else { panic!("expected error") };
            assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
        }
    }
}
