//! Database repositories (PostgreSQL).
//!
//! This module contains traits and implementations for database access.
//! Each repository is abstracted behind a trait to enable mocking in tests.
//!
//! ## Repositories
//!
//! - **sets** - Flashcard sets and their tags
//! - **cards** - Flashcards within a set
//! - **collections** - Collections grouping sets
//! - **comments**, **ratings**, **favorites** - Polymorphic associations
//!   pointing at a set or collection (see [`crate::targets`])
//! - **quota_policy** - The singleton quota policy row
//! - **quota_ledger** - Per-user, per-day creation counters
//!
//! ## Usage in Handlers
//!
//! Repositories are accessed via `state.repos`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let set = state.repos.sets.find_by_id(set_id).await?;
//!     let cards = state.repos.cards.list_by_set(set_id).await?;
//! }
//! ```

mod associations;
mod cards;
mod collections;
mod comments;
mod favorites;
mod quota_ledger;
mod quota_policy;
mod ratings;
mod sets;
mod status;

pub use cards::{CardRepo, PgCardRepo};
pub use collections::{CollectionRepo, PgCollectionRepo};
pub use comments::{CommentRepo, PgCommentRepo};
pub use favorites::{FavoriteRepo, PgFavoriteRepo};
pub use quota_ledger::PgQuotaLedger;
pub use quota_policy::{PgQuotaPolicyRepo, QuotaPolicyRepo};
pub use ratings::{PgRatingRepo, RatingRepo};
pub use sets::{PgSetRepo, SetRepo};
pub use status::{PgStatusRepo, StatusRepo};

#[cfg(test)]
pub use cards::MockCardRepo;
#[cfg(test)]
pub use collections::MockCollectionRepo;
#[cfg(test)]
pub use comments::MockCommentRepo;
#[cfg(test)]
pub use favorites::MockFavoriteRepo;
#[cfg(test)]
pub use quota_policy::MockQuotaPolicyRepo;
#[cfg(test)]
pub use ratings::MockRatingRepo;
#[cfg(test)]
pub use sets::MockSetRepo;
#[cfg(test)]
pub use status::MockStatusRepo;

use std::sync::Arc;

/// Collection of all database repositories.
#[derive(Clone)]
pub struct Repos {
    pub sets: Arc<dyn SetRepo>,
    pub cards: Arc<dyn CardRepo>,
    pub collections: Arc<dyn CollectionRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub ratings: Arc<dyn RatingRepo>,
    pub favorites: Arc<dyn FavoriteRepo>,
    pub quota_policy: Arc<dyn QuotaPolicyRepo>,
    pub status: Arc<dyn StatusRepo>,
}
