//! Global quota policy and its cached provider.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use shared::api::QuotaPolicyPayload;
use tokio::sync::RwLock;

use super::QuotaKind;
use crate::repos::QuotaPolicyRepo;

/// Per-day creation limits applied to every non-exempt user.
///
/// A limit of `0` means the kind is unlimited, not forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub max_sets_per_period: u32,
    pub max_cards_per_period: u32,
    pub max_collections_per_period: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            max_sets_per_period: 5,
            max_cards_per_period: 50,
            max_collections_per_period: 5,
        }
    }
}

impl QuotaPolicy {
    /// The configured value for `kind`, 0 included.
    pub fn configured(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Set => self.max_sets_per_period,
            QuotaKind::Card => self.max_cards_per_period,
            QuotaKind::Collection => self.max_collections_per_period,
        }
    }

    /// The enforced limit for `kind`, or None when unlimited.
    pub fn limit_for(&self, kind: QuotaKind) -> Option<u32> {
        match self.configured(kind) {
            0 => None,
            n => Some(n),
        }
    }
}

impl From<QuotaPolicyPayload> for QuotaPolicy {
    fn from(p: QuotaPolicyPayload) -> Self {
        Self {
            max_sets_per_period: p.max_sets_per_period,
            max_cards_per_period: p.max_cards_per_period,
            max_collections_per_period: p.max_collections_per_period,
        }
    }
}

impl From<QuotaPolicy> for QuotaPolicyPayload {
    fn from(p: QuotaPolicy) -> Self {
        Self {
            max_sets_per_period: p.max_sets_per_period,
            max_cards_per_period: p.max_cards_per_period,
            max_collections_per_period: p.max_collections_per_period,
        }
    }
}

/// Source of the current quota policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PolicyProvider: Send + Sync {
    /// Current policy, created with defaults on first access.
    async fn get_policy(&self) -> Result<QuotaPolicy>;

    /// Overwrite the policy. Returns the stored value.
    async fn set_policy(&self, policy: QuotaPolicy) -> Result<QuotaPolicy>;
}

/// Policy provider backed by the singleton row, with a short-lived cache.
///
/// Writes go through this provider and refresh the cache immediately; edits
/// made directly in the database show up once the cache entry expires.
pub struct CachedPolicyProvider {
    repo: Arc<dyn QuotaPolicyRepo>,
    ttl: Duration,
    cached: RwLock<Option<(QuotaPolicy, Instant)>>,
}

impl CachedPolicyProvider {
    pub fn new(repo: Arc<dyn QuotaPolicyRepo>, ttl: Duration) -> Self {
        Self {
            repo,
            ttl,
            cached: RwLock::new(None),
        }
    }
}

#[async_trait]
impl PolicyProvider for CachedPolicyProvider {
    async fn get_policy(&self) -> Result<QuotaPolicy> {
        if let Some((policy, fetched_at)) = *self.cached.read().await
            && fetched_at.elapsed() < self.ttl
        {
            return Ok(policy);
        }

        let policy = self.repo.get_or_create().await?;
        *self.cached.write().await = Some((policy, Instant::now()));
        Ok(policy)
    }

    async fn set_policy(&self, policy: QuotaPolicy) -> Result<QuotaPolicy> {
        let stored = self.repo.upsert(&policy).await?;
        *self.cached.write().await = Some((stored, Instant::now()));

        tracing::info!(
            max_sets = stored.max_sets_per_period,
            max_cards = stored.max_cards_per_period,
            max_collections = stored.max_collections_per_period,
            "quota policy updated"
        );

        Ok(stored)
    }
}
