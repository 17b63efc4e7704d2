//! Shared test utilities for API handler tests.
//!
//! Provides common mock factories, in-memory fakes for the stateful
//! repositories, and a flexible `TestStateBuilder` for constructing
//! `AppState` instances with only the mocks needed for each test.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::{TestStateBuilder, mock_set};
//!
//! let mut sets = MockSetRepo::new();
//! sets.expect_find_by_id().returning(move |_| Ok(Some(mock_set(author))));
//!
//! let state = TestStateBuilder::new()
//!     .with_set_repo(sets)
//!     .build();
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::response::Response;
use chrono::Utc;
use http_body_util::BodyExt;
use uuid::Uuid;

use crate::config::{Config, LedgerBackend};
use crate::models::{Collection, Comment, Flashcard, FlashcardSet};
use crate::quota::{
    MemoryQuotaLedger, MockPolicyProvider, PolicyProvider, QuotaLedgerStore, QuotaPolicy,
    RateLimiter,
};
use crate::repos::{
    CardRepo, CollectionRepo, CommentRepo, FavoriteRepo, MockCardRepo, MockCollectionRepo,
    MockCommentRepo, MockFavoriteRepo, MockQuotaPolicyRepo, MockRatingRepo, MockSetRepo,
    MockStatusRepo, RatingRepo, Repos, SetRepo, StatusRepo,
};
use crate::services::{AuthService, MockAuthService};
use crate::state::AppState;
use crate::targets::{TargetKind, TargetRef};

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        database_url: "postgres://test".to_string(),
        redis_url: None,
        ledger_backend: LedgerBackend::Postgres,
        policy_cache_secs: 30,
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// Creates a mock set owned by `author_id`.
pub fn mock_set(author_id: Uuid) -> FlashcardSet {
    FlashcardSet {
        id: Uuid::new_v4(),
        name: "Spanish verbs".to_string(),
        author_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Creates a mock card in `set_id`.
pub fn mock_card(set_id: Uuid) -> Flashcard {
    Flashcard {
        id: Uuid::new_v4(),
        set_id,
        question: "hablar".to_string(),
        answer: "to speak".to_string(),
        difficulty: None,
        created_at: Utc::now(),
    }
}

/// Creates a mock collection owned by `author_id`.
pub fn mock_collection(author_id: Option<Uuid>) -> Collection {
    Collection {
        id: Uuid::new_v4(),
        name: "Languages".to_string(),
        description: None,
        author_id,
        created_at: Utc::now(),
    }
}

/// Creates a mock comment on `target`.
pub fn mock_comment(author_id: Uuid, target: TargetRef) -> Comment {
    Comment {
        id: Uuid::new_v4(),
        author_id: Some(author_id),
        body: "Great set!".to_string(),
        target_kind: target.kind(),
        target_id: target.id(),
        created_at: Utc::now(),
    }
}

/// Reads a response body as JSON.
pub async fn response_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Policy provider mock that always returns `policy`.
pub fn fixed_policy(policy: QuotaPolicy) -> MockPolicyProvider {
    let mut provider = MockPolicyProvider::new();
    provider.expect_get_policy().returning(move || Ok(policy));
    provider
}

/// Ratings kept in memory, keyed by (rater, target).
#[derive(Default)]
pub struct MemoryRatingRepo {
    scores: Mutex<HashMap<(Uuid, TargetRef), i16>>,
}

#[async_trait]
impl RatingRepo for MemoryRatingRepo {
    async fn upsert(&self, rater_id: Uuid, target: TargetRef, score: i16) -> Result<()> {
        self.scores.lock().unwrap().insert((rater_id, target), score);
        Ok(())
    }

    async fn average_score(&self, target: TargetRef) -> Result<Option<f64>> {
        let scores = self.scores.lock().unwrap();
        let matching: Vec<f64> = scores
            .iter()
            .filter(|((_, t), _)| *t == target)
            .map(|(_, s)| f64::from(*s))
            .collect();

        if matching.is_empty() {
            return Ok(None);
        }
        Ok(Some(matching.iter().sum::<f64>() / matching.len() as f64))
    }
}

/// Favorites kept in memory, keyed by (owner, target).
#[derive(Default)]
pub struct MemoryFavoriteRepo {
    entries: Mutex<HashSet<(Uuid, TargetRef)>>,
}

#[async_trait]
impl FavoriteRepo for MemoryFavoriteRepo {
    async fn toggle(&self, owner_id: Uuid, target: TargetRef) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        if entries.remove(&(owner_id, target)) {
            Ok(false)
        } else {
            entries.insert((owner_id, target));
            Ok(true)
        }
    }

    async fn list_sets(&self, owner_id: Uuid) -> Result<Vec<FlashcardSet>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|(owner, target)| *owner == owner_id && target.kind() == TargetKind::Set)
            .map(|(_, target)| FlashcardSet {
                id: target.id(),
                ..mock_set(Uuid::new_v4())
            })
            .collect())
    }
}

/// Builder for constructing test `AppState` with custom mocks.
///
/// Uses default (empty) mocks for any repo/service not explicitly set, an
/// empty in-memory quota ledger, and the default quota policy. This allows
/// tests to only configure the mocks they actually need.
pub struct TestStateBuilder {
    set_repo: Option<Arc<dyn SetRepo>>,
    card_repo: Option<Arc<dyn CardRepo>>,
    collection_repo: Option<Arc<dyn CollectionRepo>>,
    comment_repo: Option<Arc<dyn CommentRepo>>,
    rating_repo: Option<Arc<dyn RatingRepo>>,
    favorite_repo: Option<Arc<dyn FavoriteRepo>>,
    status_repo: Option<Arc<dyn StatusRepo>>,
    ledger: Option<Arc<dyn QuotaLedgerStore>>,
    policy: Option<Arc<dyn PolicyProvider>>,
    auth_service: Option<MockAuthService>,
}

impl TestStateBuilder {
    /// Creates a new builder with no mocks configured.
    pub fn new() -> Self {
        Self {
            set_repo: None,
            card_repo: None,
            collection_repo: None,
            comment_repo: None,
            rating_repo: None,
            favorite_repo: None,
            status_repo: None,
            ledger: None,
            policy: None,
            auth_service: None,
        }
    }

    pub fn with_set_repo(mut self, repo: impl SetRepo + 'static) -> Self {
        self.set_repo = Some(Arc::new(repo));
        self
    }

    pub fn with_card_repo(mut self, repo: impl CardRepo + 'static) -> Self {
        self.card_repo = Some(Arc::new(repo));
        self
    }

    pub fn with_collection_repo(mut self, repo: impl CollectionRepo + 'static) -> Self {
        self.collection_repo = Some(Arc::new(repo));
        self
    }

    pub fn with_comment_repo(mut self, repo: impl CommentRepo + 'static) -> Self {
        self.comment_repo = Some(Arc::new(repo));
        self
    }

    pub fn with_rating_repo(mut self, repo: impl RatingRepo + 'static) -> Self {
        self.rating_repo = Some(Arc::new(repo));
        self
    }

    pub fn with_favorite_repo(mut self, repo: impl FavoriteRepo + 'static) -> Self {
        self.favorite_repo = Some(Arc::new(repo));
        self
    }

    pub fn with_status_repo(mut self, repo: impl StatusRepo + 'static) -> Self {
        self.status_repo = Some(Arc::new(repo));
        self
    }

    /// Use a specific ledger, e.g. a shared `Arc<MemoryQuotaLedger>` the test
    /// inspects afterwards.
    pub fn with_ledger(mut self, ledger: Arc<dyn QuotaLedgerStore>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_policy(mut self, policy: impl PolicyProvider + 'static) -> Self {
        self.policy = Some(Arc::new(policy));
        self
    }

    pub fn with_auth_service(mut self, service: MockAuthService) -> Self {
        self.auth_service = Some(service);
        self
    }

    /// Builds the `AppState` using configured mocks or defaults.
    pub fn build(self) -> AppState {
        let repos = Repos {
            sets: self.set_repo.unwrap_or_else(|| Arc::new(MockSetRepo::new())),
            cards: self.card_repo.unwrap_or_else(|| Arc::new(MockCardRepo::new())),
            collections: self
                .collection_repo
                .unwrap_or_else(|| Arc::new(MockCollectionRepo::new())),
            comments: self
                .comment_repo
                .unwrap_or_else(|| Arc::new(MockCommentRepo::new())),
            ratings: self
                .rating_repo
                .unwrap_or_else(|| Arc::new(MockRatingRepo::new())),
            favorites: self
                .favorite_repo
                .unwrap_or_else(|| Arc::new(MockFavoriteRepo::new())),
            quota_policy: Arc::new(MockQuotaPolicyRepo::new()),
            status: self
                .status_repo
                .unwrap_or_else(|| Arc::new(MockStatusRepo::new())),
        };

        let ledger = self
            .ledger
            .unwrap_or_else(|| Arc::new(MemoryQuotaLedger::new()));
        let policy = self
            .policy
            .unwrap_or_else(|| Arc::new(fixed_policy(QuotaPolicy::default())));
        let auth = Arc::new(self.auth_service.unwrap_or_else(MockAuthService::new))
            as Arc<dyn AuthService>;

        AppState {
            config: test_config(),
            repos,
            limiter: RateLimiter::new(ledger, policy.clone()),
            policy,
            auth,
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
