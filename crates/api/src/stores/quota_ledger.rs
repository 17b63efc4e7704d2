//! Quota ledger stored in Redis.
//!
//! One hash per user per period. Conditional increments run as Lua scripts
//! so the compare and the increment are a single atomic step. Each hash
//! expires at the start of the following period.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::quota::{LedgerBump, QuotaKind, QuotaLedger, QuotaLedgerStore, next_period_start};

const LAST_RESET: &str = "last_reset";

/// KEYS[1] ledger hash. ARGV: field, limit (-1 for none), now, expire-at.
/// Returns {1, new_count} when counted, {0, count} when at the limit.
const TRY_BUMP_SCRIPT: &str = r"
local count = tonumber(redis.call('HGET', KEYS[1], ARGV[1]) or '0')
local limit = tonumber(ARGV[2])
if redis.call('HSETNX', KEYS[1], 'last_reset', ARGV[3]) == 1 then
    redis.call('EXPIREAT', KEYS[1], ARGV[4])
end
if limit >= 0 and count >= limit then
    return {0, count}
end
return {1, redis.call('HINCRBY', KEYS[1], ARGV[1], 1)}
";

/// KEYS[1] ledger hash. ARGV: field.
const RELEASE_SCRIPT: &str = r"
local count = tonumber(redis.call('HGET', KEYS[1], ARGV[1]) or '0')
if count > 0 then
    redis.call('HINCRBY', KEYS[1], ARGV[1], -1)
end
return count
";

/// KEYS[1] ledger hash. ARGV: now, expire-at.
const INIT_SCRIPT: &str = r"
if redis.call('HSETNX', KEYS[1], 'last_reset', ARGV[1]) == 1 then
    redis.call('EXPIREAT', KEYS[1], ARGV[2])
end
return 1
";

fn ledger_key(user_id: Uuid, period: NaiveDate) -> String {
    format!("quota:{}:{}", user_id, period.format("%Y-%m-%d"))
}

fn ledger_from_hash(
    user_id: Uuid,
    period: NaiveDate,
    hash: &HashMap<String, String>,
) -> Result<QuotaLedger> {
    let counter = |kind: QuotaKind| -> Result<u32> {
        match hash.get(kind.redis_field()) {
            Some(v) => v
                .parse()
                .with_context(|| format!("invalid {} counter {:?}", kind.redis_field(), v)),
            None => Ok(0),
        }
    };

    let last_reset = match hash.get(LAST_RESET) {
        Some(v) => DateTime::parse_from_rfc3339(v)
            .with_context(|| format!("invalid last_reset {v:?}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let mut ledger = QuotaLedger::empty(user_id, period, last_reset);
    ledger.sets_created = counter(QuotaKind::Set)?;
    ledger.cards_created = counter(QuotaKind::Card)?;
    ledger.collections_created = counter(QuotaKind::Collection)?;
    Ok(ledger)
}

/// Redis implementation of QuotaLedgerStore.
#[derive(Clone)]
pub struct RedisQuotaLedger {
    client: redis::Client,
}

impl RedisQuotaLedger {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuotaLedgerStore for RedisQuotaLedger {
    async fn get_or_create(&self, user_id: Uuid, period: NaiveDate) -> Result<QuotaLedger> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = ledger_key(user_id, period);

        let _: i64 = redis::Script::new(INIT_SCRIPT)
            .key(&key)
            .arg(Utc::now().to_rfc3339())
            .arg(next_period_start(period).timestamp())
            .invoke_async(&mut conn)
            .await?;

        let hash: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(&key)
            .query_async(&mut conn)
            .await?;

        ledger_from_hash(user_id, period, &hash)
    }

    async fn try_bump(
        &self,
        user_id: Uuid,
        period: NaiveDate,
        kind: QuotaKind,
        limit: Option<u32>,
    ) -> Result<LedgerBump> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let limit_arg = limit.map(i64::from).unwrap_or(-1);
        let (counted, count): (i64, i64) = redis::Script::new(TRY_BUMP_SCRIPT)
            .key(ledger_key(user_id, period))
            .arg(kind.redis_field())
            .arg(limit_arg)
            .arg(Utc::now().to_rfc3339())
            .arg(next_period_start(period).timestamp())
            .invoke_async(&mut conn)
            .await?;

        let count = u32::try_from(count)?;
        if counted == 1 {
            Ok(LedgerBump::Counted(count))
        } else {
            Ok(LedgerBump::AtLimit(count))
        }
    }

    async fn release(&self, user_id: Uuid, period: NaiveDate, kind: QuotaKind) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(ledger_key(user_id, period))
            .arg(kind.redis_field())
            .invoke_async(&mut conn)
            .await?;

        tracing::info!(%user_id, %kind, %period, "quota slot released");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
