//! Favorite repository for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    models::FlashcardSet,
    targets::{TargetKind, TargetRef},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoriteRepo: Send + Sync {
    /// Add the favorite if absent, remove it if present. Returns true when
    /// the target is a favorite afterwards.
    async fn toggle(&self, owner_id: Uuid, target: TargetRef) -> Result<bool>;

    /// Sets favorited by `owner_id`, most recently added first.
    async fn list_sets(&self, owner_id: Uuid) -> Result<Vec<FlashcardSet>>;
}

/// PostgreSQL implementation of FavoriteRepo.
#[derive(Clone)]
pub struct PgFavoriteRepo {
    pool: Pool<Postgres>,
}

impl PgFavoriteRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Rounds of insert-then-delete before a toggle gives up.
const MAX_TOGGLE_ATTEMPTS: usize = 3;

/// Row operations a favorite toggle is made of.
#[async_trait]
trait FavoriteRows: Send {
    /// Insert the favorite unless it exists. True when a row was inserted.
    async fn insert(&mut self) -> Result<bool>;

    /// Delete the favorite. True when a row was deleted.
    async fn delete(&mut self) -> Result<bool>;
}

/// Insert first, delete if the row was already there. When a concurrent
/// toggle removed the row in between, start over, so every toggle flips
/// the state once.
async fn toggle_rows(rows: &mut impl FavoriteRows) -> Result<bool> {
    for _ in 0..MAX_TOGGLE_ATTEMPTS {
        if rows.insert().await? {
            return Ok(true);
        }
        if rows.delete().await? {
            return Ok(false);
        }
    }
    anyhow::bail!("favorite toggle did not settle after {MAX_TOGGLE_ATTEMPTS} attempts")
}

struct PgFavoriteRows<'a> {
    conn: &'a mut PgConnection,
    owner_id: Uuid,
    target: TargetRef,
}

#[async_trait]
impl<'a> FavoriteRows for PgFavoriteRows<'a> {
    async fn insert(&mut self) -> Result<bool> {
        let inserted = sqlx::query(
            "INSERT INTO favorites (owner_id, target_kind, target_id)
             VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(self.owner_id)
        .bind(self.target.kind())
        .bind(self.target.id())
        .execute(&mut *self.conn)
        .await?
        .rows_affected();
        Ok(inserted > 0)
    }

    async fn delete(&mut self) -> Result<bool> {
        let removed = sqlx::query(
            "DELETE FROM favorites WHERE owner_id = $1 AND target_kind = $2 AND target_id = $3",
        )
        .bind(self.owner_id)
        .bind(self.target.kind())
        .bind(self.target.id())
        .execute(&mut *self.conn)
        .await?
        .rows_affected();
        Ok(removed > 0)
    }
}

#[async_trait]
impl FavoriteRepo for PgFavoriteRepo {
    async fn toggle(&self, owner_id: Uuid, target: TargetRef) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;

        // Each statement runs on its own so a retry sees rows committed by
        // concurrent toggles.
        toggle_rows(&mut PgFavoriteRows {
            conn: &mut *conn,
            owner_id,
            target,
        })
        .await
    }

    async fn list_sets(&self, owner_id: Uuid) -> Result<Vec<FlashcardSet>> {
        let sets = sqlx::query_as::<_, FlashcardSet>(
            "SELECT s.* FROM flashcard_sets s
             JOIN favorites f ON f.target_id = s.id AND f.target_kind = $2
             WHERE f.owner_id = $1
             ORDER BY f.added_at DESC",
        )
        .bind(owner_id)
        .bind(TargetKind::Set)
        .fetch_all(&self.pool)
        .await?;
        Ok(sets)
    }
}
