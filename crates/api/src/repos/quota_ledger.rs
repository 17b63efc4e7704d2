//! Quota ledger stored in PostgreSQL, one row per user per period.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    models::QuotaLedgerRow,
    quota::{LedgerBump, QuotaKind, QuotaLedger, QuotaLedgerStore},
};

/// PostgreSQL implementation of QuotaLedgerStore.
///
/// `try_bump` is a single upsert whose update only fires below the limit, so
/// concurrent admissions serialize on the row lock.
#[derive(Clone)]
pub struct PgQuotaLedger {
    pool: Pool<Postgres>,
}

impl PgQuotaLedger {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn current(&self, user_id: Uuid, period: NaiveDate, kind: QuotaKind) -> Result<u32> {
        let sql = format!(
            "SELECT {} FROM quota_ledgers WHERE user_id = $1 AND period = $2",
            kind.ledger_column()
        );
        let count: Option<i32> = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(period)
            .fetch_optional(&self.pool)
            .await?;
        Ok(u32::try_from(count.unwrap_or(0))?)
    }
}

#[async_trait]
impl QuotaLedgerStore for PgQuotaLedger {
    async fn get_or_create(&self, user_id: Uuid, period: NaiveDate) -> Result<QuotaLedger> {
        sqlx::query(
            "INSERT INTO quota_ledgers (user_id, period) VALUES ($1, $2)
             ON CONFLICT (user_id, period) DO NOTHING",
        )
        .bind(user_id)
        .bind(period)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, QuotaLedgerRow>(
            "SELECT * FROM quota_ledgers WHERE user_id = $1 AND period = $2",
        )
        .bind(user_id)
        .bind(period)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn try_bump(
        &self,
        user_id: Uuid,
        period: NaiveDate,
        kind: QuotaKind,
        limit: Option<u32>,
    ) -> Result<LedgerBump> {
        if limit == Some(0) {
            return Ok(LedgerBump::AtLimit(self.current(user_id, period, kind).await?));
        }

        let column = kind.ledger_column();
        let sql = format!(
            "INSERT INTO quota_ledgers (user_id, period, {column}) VALUES ($1, $2, 1)
             ON CONFLICT (user_id, period) DO UPDATE
             SET {column} = quota_ledgers.{column} + 1
             WHERE $3::INTEGER IS NULL OR quota_ledgers.{column} < $3
             RETURNING {column}"
        );
        let limit = limit.map(i32::try_from).transpose()?;

        let counted: Option<i32> = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(period)
            .bind(limit)
            .fetch_optional(&self.pool)
            .await?;

        match counted {
            Some(count) => Ok(LedgerBump::Counted(u32::try_from(count)?)),
            None => Ok(LedgerBump::AtLimit(self.current(user_id, period, kind).await?)),
        }
    }

    async fn release(&self, user_id: Uuid, period: NaiveDate, kind: QuotaKind) -> Result<()> {
        let column = kind.ledger_column();
        let sql = format!(
            "UPDATE quota_ledgers SET {column} = {column} - 1
             WHERE user_id = $1 AND period = $2 AND {column} > 0"
        );
        sqlx::query(&sql)
            .bind(user_id)
            .bind(period)
            .execute(&self.pool)
            .await?;

        tracing::info!(%user_id, %kind, %period, "quota slot released");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let exists: Option<String> =
            sqlx::query_scalar("SELECT to_regclass('public.quota_ledgers')::TEXT")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.is_some())
    }
}
