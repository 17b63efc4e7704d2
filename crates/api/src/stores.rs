//! Ephemeral stores (Redis).
//!
//! Data stored here expires on its own. Selected with
//! `FLASHDECK_LEDGER_BACKEND=redis`.
//!
//! ## Redis Key Patterns
//!
//! ```text
//! quota:{user_id}:{YYYY-MM-DD}   → Hash: sets, cards, collections, last_reset
//!                                   (expires at the next UTC midnight)
//! ```

mod quota_ledger;

pub use quota_ledger::RedisQuotaLedger;
