//! Polymorphic association targets.
//!
//! Comments, ratings and favorites point at either a flashcard set or a
//! collection through a `(target_kind, target_id)` pair. The pair has no
//! foreign key, so every write resolves it here first.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Collection, FlashcardSet},
    repos::Repos,
};

/// Kind of entity an association can point at. Stored as the `target_kind` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "target_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Set,
    Collection,
}

impl TargetKind {
    /// Parse the kind segment of a request. Anything but `set` or `collection`
    /// is a validation error.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "set" => Ok(TargetKind::Set),
            "collection" => Ok(TargetKind::Collection),
            _ => Err(AppError::Validation("invalid type".into())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Set => "set",
            TargetKind::Collection => "collection",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unresolved reference to a set or collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRef {
    Set(Uuid),
    Collection(Uuid),
}

impl TargetRef {
    pub fn new(kind: TargetKind, id: Uuid) -> Self {
        match kind {
            TargetKind::Set => TargetRef::Set(id),
            TargetKind::Collection => TargetRef::Collection(id),
        }
    }

    pub fn parse(kind: &str, id: Uuid) -> Result<Self, AppError> {
        Ok(Self::new(TargetKind::parse(kind)?, id))
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TargetRef::Set(_) => TargetKind::Set,
            TargetRef::Collection(_) => TargetKind::Collection,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            TargetRef::Set(id) | TargetRef::Collection(id) => *id,
        }
    }
}

/// A reference that was found in the database.
#[derive(Debug, Clone)]
pub enum Target {
    Set(FlashcardSet),
    Collection(Collection),
}

impl Target {
    pub fn target_ref(&self) -> TargetRef {
        match self {
            Target::Set(set) => TargetRef::Set(set.id),
            Target::Collection(collection) => TargetRef::Collection(collection.id),
        }
    }
}

/// Load the entity behind `target`, or fail with 404.
pub async fn resolve(repos: &Repos, target: TargetRef) -> Result<Target, AppError> {
    let found = match target {
        TargetRef::Set(id) => repos.sets.find_by_id(id).await?.map(Target::Set),
        TargetRef::Collection(id) => repos.collections.find_by_id(id).await?.map(Target::Collection),
    };

    found.ok_or(match target.kind() {
        TargetKind::Set => AppError::External(StatusCode::NOT_FOUND, "Set not found"),
        TargetKind::Collection => AppError::External(StatusCode::NOT_FOUND, "Collection not found"),
    })
}
