use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::targets::TargetKind;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub id: Uuid,
    pub name: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Card difficulty as stored in the `difficulty` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "difficulty", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl From<shared::api::Difficulty> for Difficulty {
    fn from(d: shared::api::Difficulty) -> Self {
        match d {
            shared::api::Difficulty::Easy => Difficulty::Easy,
            shared::api::Difficulty::Medium => Difficulty::Medium,
            shared::api::Difficulty::Hard => Difficulty::Hard,
        }
    }
}

impl From<Difficulty> for shared::api::Difficulty {
    fn from(d: Difficulty) -> Self {
        match d {
            Difficulty::Easy => shared::api::Difficulty::Easy,
            Difficulty::Medium => shared::api::Difficulty::Medium,
            Difficulty::Hard => shared::api::Difficulty::Hard,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: Uuid,
    pub set_id: Uuid,
    pub question: String,
    pub answer: String,
    pub difficulty: Option<Difficulty>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// None once the author's account is deleted.
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Comment attached to a set or collection.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub body: String,
    pub target_kind: TargetKind,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Raw `quota_policy` row. Converted into [`crate::quota::QuotaPolicy`].
#[derive(Debug, Clone, FromRow)]
pub struct QuotaPolicyRow {
    pub max_sets_per_period: i32,
    pub max_cards_per_period: i32,
    pub max_collections_per_period: i32,
    pub updated_at: DateTime<Utc>,
}

/// Raw `quota_ledgers` row. Converted into [`crate::quota::QuotaLedger`].
#[derive(Debug, Clone, FromRow)]
pub struct QuotaLedgerRow {
    pub user_id: Uuid,
    pub period: NaiveDate,
    pub sets_created: i32,
    pub cards_created: i32,
    pub collections_created: i32,
    pub last_reset: DateTime<Utc>,
}
