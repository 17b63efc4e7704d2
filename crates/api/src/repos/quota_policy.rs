//! Quota policy repository for PostgreSQL.
//!
//! The policy is a single row (`id = 1`); the table's check constraint makes
//! a second row impossible.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{models::QuotaPolicyRow, quota::QuotaPolicy};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuotaPolicyRepo: Send + Sync {
    /// The singleton policy, inserted with default limits if missing.
    async fn get_or_create(&self) -> Result<QuotaPolicy>;

    /// Overwrite the singleton policy.
    async fn upsert(&self, policy: &QuotaPolicy) -> Result<QuotaPolicy>;
}

/// PostgreSQL implementation of QuotaPolicyRepo.
#[derive(Clone)]
pub struct PgQuotaPolicyRepo {
    pool: Pool<Postgres>,
}

impl PgQuotaPolicyRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

impl TryFrom<QuotaPolicyRow> for QuotaPolicy {
    type Error = anyhow::Error;

    fn try_from(row: QuotaPolicyRow) -> Result<Self> {
        Ok(Self {
            max_sets_per_period: u32::try_from(row.max_sets_per_period)?,
            max_cards_per_period: u32::try_from(row.max_cards_per_period)?,
            max_collections_per_period: u32::try_from(row.max_collections_per_period)?,
        })
    }
}

fn to_column(value: u32) -> Result<i32> {
    Ok(i32::try_from(value)?)
}

#[async_trait]
impl QuotaPolicyRepo for PgQuotaPolicyRepo {
    async fn get_or_create(&self) -> Result<QuotaPolicy> {
        // Column defaults hold the default limits
        sqlx::query("INSERT INTO quota_policy (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
            .execute(&self.pool)
            .await?;

        let row = sqlx::query_as::<_, QuotaPolicyRow>(
            "SELECT max_sets_per_period, max_cards_per_period, max_collections_per_period, updated_at
             FROM quota_policy WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn upsert(&self, policy: &QuotaPolicy) -> Result<QuotaPolicy> {
        let row = sqlx::query_as::<_, QuotaPolicyRow>(
            "INSERT INTO quota_policy (id, max_sets_per_period, max_cards_per_period, max_collections_per_period)
             VALUES (1, $1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET
                 max_sets_per_period = EXCLUDED.max_sets_per_period,
                 max_cards_per_period = EXCLUDED.max_cards_per_period,
                 max_collections_per_period = EXCLUDED.max_collections_per_period,
                 updated_at = now()
             RETURNING max_sets_per_period, max_cards_per_period, max_collections_per_period, updated_at",
        )
        .bind(to_column(policy.max_sets_per_period)?)
        .bind(to_column(policy.max_cards_per_period)?)
        .bind(to_column(policy.max_collections_per_period)?)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }
}
