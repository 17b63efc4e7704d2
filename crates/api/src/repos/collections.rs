//! Collection repository for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::associations;
use crate::{models::Collection, targets::TargetKind};

/// Repository for collections of flashcard sets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Collection>>;

    /// Create a collection grouping `set_ids`. The ids must already exist.
    async fn create(
        &self,
        author_id: Uuid,
        name: &str,
        description: Option<String>,
        set_ids: &[Uuid],
    ) -> Result<Collection>;

    /// Ids of the sets in a collection.
    async fn set_ids(&self, id: Uuid) -> Result<Vec<Uuid>>;

    /// Collections created by `author_id`, newest first.
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Collection>>;

    /// Any one collection, picked at random. None when there are none.
    async fn random(&self) -> Result<Option<Collection>>;

    /// Returns true if the set was not in the collection before.
    async fn add_set(&self, id: Uuid, set_id: Uuid) -> Result<bool>;

    /// Returns true if the set was in the collection.
    async fn remove_set(&self, id: Uuid, set_id: Uuid) -> Result<bool>;

    /// Delete a collection and every comment, rating and favorite pointing at
    /// it. Returns true if a collection was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// PostgreSQL implementation of CollectionRepo.
#[derive(Clone)]
pub struct PgCollectionRepo {
    pool: Pool<Postgres>,
}

impl PgCollectionRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CollectionRepo for PgCollectionRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Collection>> {
        let collection = sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(collection)
    }

    async fn create(
        &self,
        author_id: Uuid,
        name: &str,
        description: Option<String>,
        set_ids: &[Uuid],
    ) -> Result<Collection> {
        let mut tx = self.pool.begin().await?;

        let collection = sqlx::query_as::<_, Collection>(
            "INSERT INTO collections (name, description, author_id)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await?;

        if !set_ids.is_empty() {
            sqlx::query(
                "INSERT INTO collection_sets (collection_id, set_id)
                 SELECT $1, * FROM UNNEST($2::UUID[])
                 ON CONFLICT DO NOTHING",
            )
            .bind(collection.id)
            .bind(set_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(collection)
    }

    async fn set_ids(&self, id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT set_id FROM collection_sets WHERE collection_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(
            "SELECT * FROM collections WHERE author_id = $1 ORDER BY created_at DESC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(collections)
    }

    async fn random(&self) -> Result<Option<Collection>> {
        let collection =
            sqlx::query_as::<_, Collection>("SELECT * FROM collections ORDER BY random() LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(collection)
    }

    async fn add_set(&self, id: Uuid, set_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO collection_sets (collection_id, set_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(set_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_set(&self, id: Uuid, set_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM collection_sets WHERE collection_id = $1 AND set_id = $2")
                .bind(id)
                .bind(set_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        associations::delete_for_target(&mut tx, TargetKind::Collection, id).await?;
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
