//! Bearer token verification against the `api_tokens` table.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

/// The user a token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Identity {
    pub user_id: Uuid,
    pub is_admin: bool,
}

/// Authentication service trait for bearer tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Look up the owner of a token. None if the token is unknown.
    async fn verify_token(&self, token: &str) -> Result<Option<Identity>>;
}

/// Tokens are stored as the lowercase hex SHA-256 of the raw token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// PostgreSQL implementation of AuthService.
#[derive(Clone)]
pub struct PgTokenAuthService {
    pool: Pool<Postgres>,
}

impl PgTokenAuthService {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthService for PgTokenAuthService {
    async fn verify_token(&self, token: &str) -> Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT u.id AS user_id, u.is_admin
             FROM api_tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.token_hash = $1",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;
        Ok(identity)
    }
}
