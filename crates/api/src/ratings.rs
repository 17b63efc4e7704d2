//! Rating aggregation for sets and collections.

use uuid::Uuid;

use crate::{
    error::AppError,
    repos::Repos,
    targets::{self, TargetRef},
};

/// Round half away from zero to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean score of `target`, rounded to one decimal. 0.0 when unrated.
///
/// Does not check that the target exists.
pub async fn average_rating(repos: &Repos, target: TargetRef) -> Result<f64, AppError> {
    let avg = repos.ratings.average_score(target).await?;
    Ok(avg.map(round_to_tenth).unwrap_or(0.0))
}

/// Mean score of an existing target. 404 if the target is missing.
pub async fn average_for(repos: &Repos, target: TargetRef) -> Result<f64, AppError> {
    targets::resolve(repos, target).await?;
    average_rating(repos, target).await
}

/// Record `rater_id`'s score for `target`, replacing any earlier score, and
/// return the new average.
pub async fn rate(
    repos: &Repos,
    rater_id: Uuid,
    target: TargetRef,
    score: i16,
) -> Result<f64, AppError> {
    if !(1..=5).contains(&score) {
        return Err(AppError::Validation("score must be 1-5".into()));
    }

    let target = targets::resolve(repos, target).await?.target_ref();
    repos.ratings.upsert(rater_id, target, score).await?;

    tracing::info!(
        %rater_id,
        target_kind = %target.kind(),
        target_id = %target.id(),
        score,
        "rating recorded"
    );

    average_rating(repos, target).await
}
