//! Shared API request/response types used by the API server and its clients.

use chrono::{DateTime, NaiveDate, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Max distinct tags on a single set.
pub const MAX_TAGS: usize = 8;
/// Max length of a single tag name.
const MAX_TAG_LEN: usize = 50;
/// Max sets grouped by one collection.
const MAX_COLLECTION_SETS: usize = 100;
/// Max length of a comment body.
pub const MAX_COMMENT_LEN: usize = 1000;
/// Upper bound for a configured per-day quota.
const MAX_QUOTA: u32 = 100_000;

/// Trims tag names, drops empty ones and removes duplicates (first occurrence wins).
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[allow(clippy::ptr_arg)]
fn validate_tags(value: &Vec<String>, _ctx: &()) -> garde::Result {
    let tags = normalize_tags(value);
    if tags.len() > MAX_TAGS {
        return Err(garde::Error::new("A set cannot have more than 8 tags."));
    }
    if tags.iter().any(|t| t.chars().count() > MAX_TAG_LEN) {
        return Err(garde::Error::new("tag names cannot exceed 50 characters"));
    }
    Ok(())
}

#[allow(clippy::ptr_arg)]
fn validate_comment_body(value: &String, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("Comment cannot be empty."));
    }
    if value.chars().count() > MAX_COMMENT_LEN {
        return Err(garde::Error::new("Comment cannot exceed 1000 characters."));
    }
    Ok(())
}

fn validate_score(value: &i16, _ctx: &()) -> garde::Result {
    if !(1..=5).contains(value) {
        return Err(garde::Error::new("score must be 1-5"));
    }
    Ok(())
}

// ============================================================================
// Flashcard sets and cards
// ============================================================================

/// Create or update a flashcard set.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetPayload {
    #[garde(length(chars, min = 1, max = 255))]
    pub name: String,
    /// Tag names; blank entries are ignored, duplicates collapse.
    #[garde(custom(validate_tags))]
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Difficulty a card author can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Add a flashcard to a set, or replace an existing one.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CardPayload {
    #[garde(length(chars, min = 1, max = 255))]
    pub question: String,
    #[garde(length(chars, min = 1, max = 255))]
    pub answer: String,
    #[garde(skip)]
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Returned after creating a set, card or collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
    /// Present when the caller is close to their daily creation limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Short form of a set, used in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSummary {
    pub id: Uuid,
    pub name: String,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Full set view.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetDetail {
    pub id: Uuid,
    pub name: String,
    pub author_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub card_count: i64,
    /// Mean of all ratings, one decimal place, 0.0 when unrated.
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CardInfo {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub difficulty: Option<Difficulty>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Collections
// ============================================================================

/// Create a collection grouping existing sets.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCollectionPayload {
    #[garde(length(chars, min = 1, max = 255))]
    pub name: String,
    #[garde(length(chars, max = 2000))]
    #[serde(default)]
    pub description: Option<String>,
    #[garde(length(max = MAX_COLLECTION_SETS))]
    #[serde(default)]
    pub set_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub author_id: Option<Uuid>,
    pub set_ids: Vec<Uuid>,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Comments, ratings and favorites
// ============================================================================

/// Post or edit a comment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentPayload {
    #[garde(custom(validate_comment_body))]
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentInfo {
    pub id: Uuid,
    /// None once the author's account is deleted.
    pub author_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RatePayload {
    #[garde(custom(validate_score))]
    pub score: i16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingResponse {
    pub average_rating: f64,
}

/// Toggle a favorite. `type` names the target kind; only `set` is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ToggleFavoritePayload {
    #[garde(length(min = 1))]
    #[serde(rename = "type")]
    pub kind: String,
    #[garde(skip)]
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleFavoriteResponse {
    pub favorited: bool,
}

// ============================================================================
// Quotas
// ============================================================================

/// Usage of one quota kind in the current period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub used: u32,
    /// None when the kind is unlimited.
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuotaStatusResponse {
    /// UTC calendar day the counters apply to.
    pub period: NaiveDate,
    /// True when the caller is exempt from quotas.
    pub exempt: bool,
    pub sets: QuotaUsage,
    pub cards: QuotaUsage,
    pub collections: QuotaUsage,
}

/// Global per-day creation limits. A limit of 0 means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuotaPolicyPayload {
    #[garde(range(max = MAX_QUOTA))]
    pub max_sets_per_period: u32,
    #[garde(range(max = MAX_QUOTA))]
    pub max_cards_per_period: u32,
    #[garde(range(max = MAX_QUOTA))]
    pub max_collections_per_period: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}
