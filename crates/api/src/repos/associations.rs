//! Cleanup of polymorphic rows pointing at a deleted set or collection.

use anyhow::Result;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::targets::TargetKind;

/// Delete comments, ratings and favorites that target `(kind, id)`.
///
/// Runs on the caller's connection so it can share the delete's transaction.
pub(super) async fn delete_for_target(
    conn: &mut PgConnection,
    kind: TargetKind,
    id: Uuid,
) -> Result<()> {
    for table in ["comments", "ratings", "favorites"] {
        let sql = format!("DELETE FROM {table} WHERE target_kind = $1 AND target_id = $2");
        sqlx::query(&sql)
            .bind(kind)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
