//! Flashcard set repository for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::associations;
use crate::{models::FlashcardSet, targets::TargetKind};

/// Repository for flashcard sets and their tags.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SetRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FlashcardSet>>;

    /// Create a set with the given (already normalized) tag names.
    async fn create(&self, author_id: Uuid, name: &str, tags: &[String]) -> Result<FlashcardSet>;

    /// Rename a set and replace its tags. Returns None if the set does not exist.
    async fn update(&self, id: Uuid, name: &str, tags: &[String]) -> Result<Option<FlashcardSet>>;

    /// Delete a set with its cards and every comment, rating and favorite
    /// pointing at it. Returns true if a set was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Tag names attached to a set, sorted.
    async fn tags_for(&self, id: Uuid) -> Result<Vec<String>>;

    /// The subset of `ids` that exist.
    async fn find_existing(&self, ids: &[Uuid]) -> Result<Vec<Uuid>>;

    /// Sets created by `author_id`, newest first.
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<FlashcardSet>>;
}

/// PostgreSQL implementation of SetRepo.
#[derive(Clone)]
pub struct PgSetRepo {
    pool: Pool<Postgres>,
}

impl PgSetRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

async fn attach_tags(conn: &mut PgConnection, set_id: Uuid, tags: &[String]) -> Result<()> {
    if tags.is_empty() {
        return Ok(());
    }

    sqlx::query("INSERT INTO tags (name) SELECT * FROM UNNEST($1::TEXT[]) ON CONFLICT (name) DO NOTHING")
        .bind(tags)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT INTO set_tags (set_id, tag_id)
         SELECT $1, id FROM tags WHERE name = ANY($2)
         ON CONFLICT DO NOTHING",
    )
    .bind(set_id)
    .bind(tags)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[async_trait]
impl SetRepo for PgSetRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FlashcardSet>> {
        let set = sqlx::query_as::<_, FlashcardSet>("SELECT * FROM flashcard_sets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(set)
    }

    async fn create(&self, author_id: Uuid, name: &str, tags: &[String]) -> Result<FlashcardSet> {
        let mut tx = self.pool.begin().await?;

        let set = sqlx::query_as::<_, FlashcardSet>(
            "INSERT INTO flashcard_sets (name, author_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await?;

        attach_tags(&mut tx, set.id, tags).await?;

        tx.commit().await?;
        Ok(set)
    }

    async fn update(&self, id: Uuid, name: &str, tags: &[String]) -> Result<Option<FlashcardSet>> {
        let mut tx = self.pool.begin().await?;

        let Some(set) = sqlx::query_as::<_, FlashcardSet>(
            "UPDATE flashcard_sets SET name = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM set_tags WHERE set_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        attach_tags(&mut tx, id, tags).await?;

        tx.commit().await?;
        Ok(Some(set))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        associations::delete_for_target(&mut tx, TargetKind::Set, id).await?;
        let result = sqlx::query("DELETE FROM flashcard_sets WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn tags_for(&self, id: Uuid) -> Result<Vec<String>> {
        let tags = sqlx::query_scalar::<_, String>(
            "SELECT t.name FROM tags t
             JOIN set_tags st ON st.tag_id = t.id
             WHERE st.set_id = $1
             ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    async fn find_existing(&self, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM flashcard_sets WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(found)
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<FlashcardSet>> {
        let sets = sqlx::query_as::<_, FlashcardSet>(
            "SELECT * FROM flashcard_sets WHERE author_id = $1 ORDER BY created_at DESC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sets)
    }
}
