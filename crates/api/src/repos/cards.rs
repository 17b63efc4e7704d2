//! Flashcard repository for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::{Difficulty, Flashcard};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CardRepo: Send + Sync {
    async fn create(
        &self,
        set_id: Uuid,
        question: &str,
        answer: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Flashcard>;

    /// Cards in a set, oldest first.
    async fn list_by_set(&self, set_id: Uuid) -> Result<Vec<Flashcard>>;

    async fn count_by_set(&self, set_id: Uuid) -> Result<i64>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Flashcard>>;

    /// Replace a card's content. Returns None if the card does not exist.
    async fn update(
        &self,
        id: Uuid,
        question: &str,
        answer: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Option<Flashcard>>;

    /// Returns true if a card was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// PostgreSQL implementation of CardRepo.
#[derive(Clone)]
pub struct PgCardRepo {
    pool: Pool<Postgres>,
}

impl PgCardRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardRepo for PgCardRepo {
    async fn create(
        &self,
        set_id: Uuid,
        question: &str,
        answer: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Flashcard> {
        let card = sqlx::query_as::<_, Flashcard>(
            "INSERT INTO flashcards (set_id, question, answer, difficulty)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(set_id)
        .bind(question)
        .bind(answer)
        .bind(difficulty)
        .fetch_one(&self.pool)
        .await?;
        Ok(card)
    }

    async fn list_by_set(&self, set_id: Uuid) -> Result<Vec<Flashcard>> {
        let cards = sqlx::query_as::<_, Flashcard>(
            "SELECT * FROM flashcards WHERE set_id = $1 ORDER BY created_at",
        )
        .bind(set_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cards)
    }

    async fn count_by_set(&self, set_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM flashcards WHERE set_id = $1")
            .bind(set_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Flashcard>> {
        let card = sqlx::query_as::<_, Flashcard>("SELECT * FROM flashcards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(card)
    }

    async fn update(
        &self,
        id: Uuid,
        question: &str,
        answer: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Option<Flashcard>> {
        let card = sqlx::query_as::<_, Flashcard>(
            "UPDATE flashcards SET question = $2, answer = $3, difficulty = $4
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(question)
        .bind(answer)
        .bind(difficulty)
        .fetch_optional(&self.pool)
        .await?;
        Ok(card)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
