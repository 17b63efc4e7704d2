//! Per-user, per-period creation counters.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::QuotaKind;
use crate::models::QuotaLedgerRow;

/// Creation counters for one user in one period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaLedger {
    pub user_id: Uuid,
    pub period: NaiveDate,
    pub sets_created: u32,
    pub cards_created: u32,
    pub collections_created: u32,
    /// When the counters for this period started.
    pub last_reset: DateTime<Utc>,
}

impl QuotaLedger {
    pub fn empty(user_id: Uuid, period: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            period,
            sets_created: 0,
            cards_created: 0,
            collections_created: 0,
            last_reset: now,
        }
    }

    pub fn count(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Set => self.sets_created,
            QuotaKind::Card => self.cards_created,
            QuotaKind::Collection => self.collections_created,
        }
    }

    #[cfg(test)]
    fn count_mut(&mut self, kind: QuotaKind) -> &mut u32 {
        match kind {
            QuotaKind::Set => &mut self.sets_created,
            QuotaKind::Card => &mut self.cards_created,
            QuotaKind::Collection => &mut self.collections_created,
        }
    }
}

impl TryFrom<QuotaLedgerRow> for QuotaLedger {
    type Error = anyhow::Error;

    fn try_from(row: QuotaLedgerRow) -> Result<Self> {
        Ok(Self {
            user_id: row.user_id,
            period: row.period,
            sets_created: u32::try_from(row.sets_created)?,
            cards_created: u32::try_from(row.cards_created)?,
            collections_created: u32::try_from(row.collections_created)?,
            last_reset: row.last_reset,
        })
    }
}

/// Outcome of a conditional increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBump {
    /// Counter incremented, includes the new value.
    Counted(u32),
    /// Counter already at the limit and left unchanged, includes its value.
    AtLimit(u32),
}

/// Storage for quota ledgers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuotaLedgerStore: Send + Sync {
    /// Ledger for (user, period), created with zeroed counters if absent.
    async fn get_or_create(&self, user_id: Uuid, period: NaiveDate) -> Result<QuotaLedger>;

    /// Atomically increment the `kind` counter by one, only if it is below
    /// `limit`. With `limit` None the increment is unconditional.
    async fn try_bump(
        &self,
        user_id: Uuid,
        period: NaiveDate,
        kind: QuotaKind,
        limit: Option<u32>,
    ) -> Result<LedgerBump>;

    /// Decrement the `kind` counter by one, never below zero.
    async fn release(&self, user_id: Uuid, period: NaiveDate, kind: QuotaKind) -> Result<()>;

    /// Verify the backing store is reachable.
    async fn health_check(&self) -> Result<bool>;
}

/// In-memory ledger for tests. A single mutex makes every operation atomic.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryQuotaLedger {
    rows: std::sync::Mutex<std::collections::HashMap<(Uuid, NaiveDate), QuotaLedger>>,
}

#[cfg(test)]
impl MemoryQuotaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter value, 0 if the row does not exist.
    pub fn count(&self, user_id: Uuid, period: NaiveDate, kind: QuotaKind) -> u32 {
        self.rows
            .lock()
            .unwrap()
            .get(&(user_id, period))
            .map(|l| l.count(kind))
            .unwrap_or(0)
    }

    /// Force a counter to `value`.
    pub fn seed(&self, user_id: Uuid, period: NaiveDate, kind: QuotaKind, value: u32) {
        let mut rows = self.rows.lock().unwrap();
        let ledger = rows
            .entry((user_id, period))
            .or_insert_with(|| QuotaLedger::empty(user_id, period, Utc::now()));
        *ledger.count_mut(kind) = value;
    }
}

#[cfg(test)]
#[async_trait]
impl QuotaLedgerStore for MemoryQuotaLedger {
    async fn get_or_create(&self, user_id: Uuid, period: NaiveDate) -> Result<QuotaLedger> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .entry((user_id, period))
            .or_insert_with(|| QuotaLedger::empty(user_id, period, Utc::now()))
            .clone())
    }

    async fn try_bump(
        &self,
        user_id: Uuid,
        period: NaiveDate,
        kind: QuotaKind,
        limit: Option<u32>,
    ) -> Result<LedgerBump> {
        let mut rows = self.rows.lock().unwrap();
        let ledger = rows
            .entry((user_id, period))
            .or_insert_with(|| QuotaLedger::empty(user_id, period, Utc::now()));
        let count = ledger.count_mut(kind);

        if let Some(limit) = limit
            && *count >= limit
        {
            return Ok(LedgerBump::AtLimit(*count));
        }

        *count += 1;
        Ok(LedgerBump::Counted(*count))
    }

    async fn release(&self, user_id: Uuid, period: NaiveDate, kind: QuotaKind) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(ledger) = rows.get_mut(&(user_id, period)) {
            let count = ledger.count_mut(kind);
            *count = count.saturating_sub(1);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
