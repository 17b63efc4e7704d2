//! The caller's creation quota for today.
//!
//! Endpoints:
//! - GET /quota - Used, limit and remaining per kind for the current UTC day

use axum::{Json, Router, debug_handler, extract::State, response::IntoResponse, routing::get};
use chrono::Utc;
use shared::api::{QuotaStatusResponse, QuotaUsage};

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    quota::{QuotaKind, QuotaLedger, QuotaPolicy},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(quota_status))
}

fn usage(ledger: &QuotaLedger, policy: &QuotaPolicy, kind: QuotaKind, exempt: bool) -> QuotaUsage {
    let used = ledger.count(kind);
    let limit = if exempt { None } else { policy.limit_for(kind) };

    QuotaUsage {
        used,
        limit,
        remaining: limit.map(|l| l.saturating_sub(used)),
    }
}

#[debug_handler]
async fn quota_status(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let subject = user.quota_subject();
    let (ledger, policy) = state.limiter.usage(subject.user_id, Utc::now()).await?;

    Ok(Json(QuotaStatusResponse {
        period: ledger.period,
        exempt: subject.exempt,
        sets: usage(&ledger, &policy, QuotaKind::Set, subject.exempt),
        cards: usage(&ledger, &policy, QuotaKind::Card, subject.exempt),
        collections: usage(&ledger, &policy, QuotaKind::Collection, subject.exempt),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::{MemoryQuotaLedger, period_for};
    use crate::test_utils::{TestStateBuilder, fixed_policy, response_json};
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn reports_today_usage() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            is_admin: false,
        };
        let today = period_for(Utc::now());
        let ledger = Arc::new(MemoryQuotaLedger::new());
        ledger.seed(user.id, today, QuotaKind::Set, 2);
        ledger.seed(user.id, today, QuotaKind::Card, 7);
        let state = TestStateBuilder::new()
            .with_ledger(ledger)
            .with_policy(fixed_policy(QuotaPolicy {
                max_collections_per_period: 0,
                ..QuotaPolicy::default()
            }))
            .build();

        let response = quota_status(user, State(state)).await.unwrap().into_response();

        let body = response_json(response).await;
        assert_eq!(body["period"], today.to_string());
        assert_eq!(body["exempt"], false);
        assert_eq!(body["sets"], serde_json::json!({"used": 2, "limit": 5, "remaining": 3}));
        assert_eq!(body["cards"]["remaining"], 43);
        assert!(body["collections"]["limit"].is_null());
        assert!(body["collections"]["remaining"].is_null());
    }

    #[tokio::test]
    async fn admin_has_no_limits() {
        let admin = AuthUser {
            id: Uuid::new_v4(),
            is_admin: true,
        };
        let state = TestStateBuilder::new().build();

        let response = quota_status(admin, State(state)).await.unwrap().into_response();

        let body = response_json(response).await;
        assert_eq!(body["exempt"], true);
        assert!(body["sets"]["limit"].is_null());
        assert_eq!(body["sets"]["used"], 0);
    }

    #[test]
    fn remaining_never_underflows() {
        let mut ledger = QuotaLedger::empty(Uuid::new_v4(), period_for(Utc::now()), Utc::now());
        ledger.sets_created = 9;

        let usage = usage(&ledger, &QuotaPolicy::default(), QuotaKind::Set, false);

        assert_eq!(usage.remaining, Some(0));
    }
}
