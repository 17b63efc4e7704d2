//! Per-user creation quotas.
//!
//! Every user may create a limited number of sets, flashcards and collections
//! per period. The period is the UTC calendar day: counters live in one ledger
//! row per (user, day), so a new day starts from zero without any reset job.
//!
//! ## Pieces
//!
//! - **kind** - the quota-bearing entity kinds and their ledger/policy fields
//! - **policy** - the global limits (a singleton row) behind a cached provider
//! - **ledger** - per-user, per-day counters with an atomic conditional increment
//! - **limiter** - the admission decision used by creation handlers
//!
//! ## Admission flow
//!
//! ```text
//! try_admit ──► limit == 0 or exempt ──► Allowed (unmetered ticket)
//!          └──► try_bump(limit) ──► counted ──► Allowed (reserved ticket, maybe warning)
//!                                └─► at limit ─► Denied(limit)
//!
//! create entity ──ok──► bump(ticket)     (records unmetered creations)
//!              └─err─► release(ticket)  (returns a reserved slot)
//! ```
//!
//! The reservation is taken with a single atomic store operation, so two
//! concurrent requests can never both claim the last slot.

mod kind;
mod ledger;
mod limiter;
mod period;
mod policy;

pub use kind::QuotaKind;
pub use ledger::{LedgerBump, QuotaLedger, QuotaLedgerStore};
pub use limiter::{QuotaSubject, RateLimiter};
pub use period::{next_period_start, period_for};
pub use policy::{CachedPolicyProvider, PolicyProvider, QuotaPolicy};

#[cfg(test)]
pub use ledger::{MemoryQuotaLedger, MockQuotaLedgerStore};
#[cfg(test)]
pub use policy::MockPolicyProvider;
