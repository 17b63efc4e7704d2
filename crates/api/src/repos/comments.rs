//! Comment repository for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{models::Comment, targets::TargetRef};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    /// Attach a comment to a resolved target.
    async fn create(&self, author_id: Uuid, target: TargetRef, body: &str) -> Result<Comment>;

    /// Comments on a target, newest first.
    async fn list_for(&self, target: TargetRef) -> Result<Vec<Comment>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Replace the body. Returns None if the comment does not exist.
    async fn update_body(&self, id: Uuid, body: &str) -> Result<Option<Comment>>;

    /// Returns true if a comment was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// PostgreSQL implementation of CommentRepo.
#[derive(Clone)]
pub struct PgCommentRepo {
    pool: Pool<Postgres>,
}

impl PgCommentRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepo for PgCommentRepo {
    async fn create(&self, author_id: Uuid, target: TargetRef, body: &str) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (author_id, body, target_kind, target_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(author_id)
        .bind(body)
        .bind(target.kind())
        .bind(target.id())
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn list_for(&self, target: TargetRef) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments
             WHERE target_kind = $1 AND target_id = $2
             ORDER BY created_at DESC",
        )
        .bind(target.kind())
        .bind(target.id())
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn update_body(&self, id: Uuid, body: &str) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "UPDATE comments SET body = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
