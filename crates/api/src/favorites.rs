//! Favorite toggling. Only sets can be favorited.

use uuid::Uuid;

use crate::{
    error::AppError,
    repos::Repos,
    targets::{self, TargetKind, TargetRef},
};

/// Flip `owner_id`'s favorite on the target named by `kind`/`id`.
/// Returns whether the target is a favorite afterwards.
pub async fn toggle_favorite(
    repos: &Repos,
    owner_id: Uuid,
    kind: &str,
    id: Uuid,
) -> Result<bool, AppError> {
    let target = match TargetKind::parse(kind)? {
        TargetKind::Set => TargetRef::Set(id),
        TargetKind::Collection => return Err(AppError::Validation("invalid type".into())),
    };

    targets::resolve(repos, target).await?;
    let favorited = repos.favorites.toggle(owner_id, target).await?;

    tracing::info!(%owner_id, set_id = %id, favorited, "favorite toggled");

    Ok(favorited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::{MockFavoriteRepo, MockSetRepo};
    use crate::test_utils::{MemoryFavoriteRepo, TestStateBuilder, mock_set};
    use axum::http::StatusCode;

    fn set_repo_with(set_id: Uuid) -> MockSetRepo {
        let mut sets = MockSetRepo::new();
        sets.expect_find_by_id().returning(move |id| {
            if id == set_id {
                let mut set = mock_set(Uuid::new_v4());
                set.id = set_id;
                Ok(Some(set))
            } else {
                Ok(None)
            }
        });
        sets
    }

    #[tokio::test]
    async fn toggling_twice_restores_state() {
        let set_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let state = TestStateBuilder::new()
            .with_set_repo(set_repo_with(set_id))
            .with_favorite_repo(MemoryFavoriteRepo::default())
            .build();

        assert!(toggle_favorite(&state.repos, owner, "set", set_id).await.unwrap());
        assert!(!toggle_favorite(&state.repos, owner, "set", set_id).await.unwrap());
        assert!(toggle_favorite(&state.repos, owner, "set", set_id).await.unwrap());
    }

    #[tokio::test]
    async fn two_toggles_leave_no_favorite() {
        let set_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let state = TestStateBuilder::new()
            .with_set_repo(set_repo_with(set_id))
            .with_favorite_repo(MemoryFavoriteRepo::default())
            .build();

        toggle_favorite(&state.repos, owner, "set", set_id).await.unwrap();
        assert_eq!(state.repos.favorites.list_sets(owner).await.unwrap().len(), 1);
        toggle_favorite(&state.repos, owner, "set", set_id).await.unwrap();

        assert!(state.repos.favorites.list_sets(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn favorites_are_per_owner() {
        let set_id = Uuid::new_v4();
        let state = TestStateBuilder::new()
            .with_set_repo(set_repo_with(set_id))
            .with_favorite_repo(MemoryFavoriteRepo::default())
            .build();

        assert!(toggle_favorite(&state.repos, Uuid::new_v4(), "set", set_id).await.unwrap());
        assert!(toggle_favorite(&state.repos, Uuid::new_v4(), "set", set_id).await.unwrap());
    }

    #[tokio::test]
    async fn collections_cannot_be_favorited() {
        let mut favorites = MockFavoriteRepo::new();
        favorites.expect_toggle().never();
        let state = TestStateBuilder::new()
            .with_favorite_repo(favorites)
            .build();

        for kind in ["collection", "card", ""] {
            let result = toggle_favorite(&state.repos, Uuid::new_v4(), kind, Uuid::new_v4()).await;
            let Err(AppError::Validation(msg)) = result else {
                panic!("expected validation error for {kind:?}");
            };
            assert_eq!(msg, "invalid type");
        }
    }

    #[tokio::test]
    async fn missing_set_is_not_found() {
        let mut favorites = MockFavoriteRepo::new();
        favorites.expect_toggle().never();
        let state = TestStateBuilder::new()
            .with_set_repo(set_repo_with(Uuid::new_v4()))
            .with_favorite_repo(favorites)
            .build();

        let result = toggle_favorite(&state.repos, Uuid::new_v4(), "set", Uuid::new_v4()).await;

        let Err(AppError::External(status, _)) = result else {
            panic!("expected not found");
        };
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
