//! Admission decisions for quota-bearing creations.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{LedgerBump, PolicyProvider, QuotaKind, QuotaLedger, QuotaLedgerStore, QuotaPolicy, period_for};
use crate::error::AppError;

/// The user asking to create something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSubject {
    pub user_id: Uuid,
    /// Admins are never denied.
    pub exempt: bool,
}

/// Proof of admission, settled with [`RateLimiter::bump`] or [`RateLimiter::release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub user_id: Uuid,
    pub kind: QuotaKind,
    pub period: NaiveDate,
    /// True when the slot was already counted at admission.
    pub reserved: bool,
}

/// Result of [`RateLimiter::try_admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed {
        ticket: Ticket,
        /// Set when half or less of the limit was left before this creation.
        warning: Option<String>,
    },
    Denied {
        limit: u32,
    },
}

/// Value produced by a creation that passed the quota check.
#[derive(Debug)]
pub struct Admitted<T> {
    pub value: T,
    pub warning: Option<String>,
}

/// Combines the quota ledger with the policy to admit or deny creations.
#[derive(Clone)]
pub struct RateLimiter {
    ledger: Arc<dyn QuotaLedgerStore>,
    policy: Arc<dyn PolicyProvider>,
}

impl RateLimiter {
    pub fn new(ledger: Arc<dyn QuotaLedgerStore>, policy: Arc<dyn PolicyProvider>) -> Self {
        Self { ledger, policy }
    }

    pub async fn try_admit(&self, subject: QuotaSubject, kind: QuotaKind) -> Result<Admission> {
        self.try_admit_at(subject, kind, Utc::now()).await
    }

    /// Decide whether `subject` may create one more `kind` in the period of `now`.
    ///
    /// Metered admissions reserve their slot here, atomically. Exempt users and
    /// unlimited kinds get an unmetered ticket and are counted by `bump`.
    pub async fn try_admit_at(
        &self,
        subject: QuotaSubject,
        kind: QuotaKind,
        now: DateTime<Utc>,
    ) -> Result<Admission> {
        let period = period_for(now);
        let policy = self.policy.get_policy().await?;

        let limit = match policy.limit_for(kind) {
            Some(limit) if !subject.exempt => limit,
            _ => {
                return Ok(Admission::Allowed {
                    ticket: Ticket {
                        user_id: subject.user_id,
                        kind,
                        period,
                        reserved: false,
                    },
                    warning: None,
                });
            }
        };

        match self
            .ledger
            .try_bump(subject.user_id, period, kind, Some(limit))
            .await?
        {
            LedgerBump::Counted(count) => {
                // Slots left before this creation took one.
                let remaining = limit.saturating_sub(count.saturating_sub(1));
                tracing::debug!(
                    user_id = %subject.user_id,
                    %kind,
                    %period,
                    count,
                    limit,
                    "quota slot reserved"
                );
                Ok(Admission::Allowed {
                    ticket: Ticket {
                        user_id: subject.user_id,
                        kind,
                        period,
                        reserved: true,
                    },
                    warning: near_limit_warning(kind, limit, remaining),
                })
            }
            LedgerBump::AtLimit(count) => {
                tracing::info!(
                    user_id = %subject.user_id,
                    %kind,
                    %period,
                    count,
                    limit,
                    "creation denied, daily quota reached"
                );
                Ok(Admission::Denied { limit })
            }
        }
    }

    /// Record a successful creation. Reserved tickets were counted at admission.
    pub async fn bump(&self, ticket: &Ticket) -> Result<()> {
        if ticket.reserved {
            return Ok(());
        }
        self.ledger
            .try_bump(ticket.user_id, ticket.period, ticket.kind, None)
            .await?;
        Ok(())
    }

    /// Give back a reserved slot after the creation failed.
    pub async fn release(&self, ticket: &Ticket) -> Result<()> {
        if !ticket.reserved {
            return Ok(());
        }
        self.ledger
            .release(ticket.user_id, ticket.period, ticket.kind)
            .await
    }

    /// Run `create` under the quota for `kind`.
    ///
    /// Denial returns [`AppError::QuotaExceeded`] without polling `create`.
    /// A failed creation releases its slot. A failed bump is logged and the
    /// created value is still returned.
    pub async fn create_within_quota<T, Fut>(
        &self,
        subject: QuotaSubject,
        kind: QuotaKind,
        create: Fut,
    ) -> Result<Admitted<T>, AppError>
    where
        Fut: Future<Output = Result<T, AppError>>,
    {
        let (ticket, warning) = match self.try_admit(subject, kind).await? {
            Admission::Allowed { ticket, warning } => (ticket, warning),
            Admission::Denied { limit } => return Err(AppError::QuotaExceeded { kind, limit }),
        };

        match create.await {
            Ok(value) => {
                if let Err(e) = self.bump(&ticket).await {
                    tracing::warn!(
                        user_id = %ticket.user_id,
                        kind = %ticket.kind,
                        "failed to record creation in quota ledger: {:?}",
                        e
                    );
                }
                Ok(Admitted { value, warning })
            }
            Err(err) => {
                if let Err(e) = self.release(&ticket).await {
                    tracing::warn!(
                        user_id = %ticket.user_id,
                        kind = %ticket.kind,
                        "failed to release quota slot: {:?}",
                        e
                    );
                }
                Err(err)
            }
        }
    }

    /// Ledger for the period of `now` together with the policy it is checked against.
    pub async fn usage(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<(QuotaLedger, QuotaPolicy)> {
        let ledger = self.ledger.get_or_create(user_id, period_for(now)).await?;
        let policy = self.policy.get_policy().await?;
        Ok((ledger, policy))
    }

    pub async fn ledger_healthy(&self) -> bool {
        self.ledger.health_check().await.unwrap_or(false)
    }
}

fn near_limit_warning(kind: QuotaKind, limit: u32, remaining: u32) -> Option<String> {
    (remaining <= limit / 2).then(|| {
        format!(
            "You are nearing your daily {kind} creation limit. Only {remaining} {kind}(s) left today."
        )
    })
}
