//! Rating repository for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::targets::TargetRef;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingRepo: Send + Sync {
    /// Insert or replace the rating `rater_id` gave `target`.
    async fn upsert(&self, rater_id: Uuid, target: TargetRef, score: i16) -> Result<()>;

    /// Unrounded mean score, None when the target has no ratings.
    async fn average_score(&self, target: TargetRef) -> Result<Option<f64>>;
}

/// PostgreSQL implementation of RatingRepo.
#[derive(Clone)]
pub struct PgRatingRepo {
    pool: Pool<Postgres>,
}

impl PgRatingRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingRepo for PgRatingRepo {
    async fn upsert(&self, rater_id: Uuid, target: TargetRef, score: i16) -> Result<()> {
        sqlx::query(
            "INSERT INTO ratings (rater_id, target_kind, target_id, score)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (rater_id, target_kind, target_id)
             DO UPDATE SET score = EXCLUDED.score, updated_at = now()",
        )
        .bind(rater_id)
        .bind(target.kind())
        .bind(target.id())
        .bind(score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn average_score(&self, target: TargetRef) -> Result<Option<f64>> {
        let avg = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(score)::FLOAT8 FROM ratings WHERE target_kind = $1 AND target_id = $2",
        )
        .bind(target.kind())
        .bind(target.id())
        .fetch_one(&self.pool)
        .await?;
        Ok(avg)
    }
}
