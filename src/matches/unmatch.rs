use axum::{Json, extract::{Path, State}};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, session};

/// Deactivate a match on behalf of one of its participants, freeing a focus
/// slot for both. One-way: an ended match is never reactivated, and a second
/// unmatch finds no active match to end.
pub async fn end_match(
    db_pool: &SqlitePool,
    match_id: &str,
    acting_user_id: &str,
) -> AppResult<()> {
    // Predicate and update in one statement so two racing unmatch calls
    // can't both claim to have ended the match.
    let updated = sqlx::query(
        "UPDATE matches SET is_active=0 WHERE id=? AND is_active=1 AND (user_a_id=? OR user_b_id=?)",
    )
    .bind(match_id)
    .bind(acting_user_id)
    .bind(acting_user_id)
    .execute(db_pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound("Active match not found"));
    }

    Ok(())
}

#[axum::debug_handler]
pub(crate) async fn unmatch(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(match_id): Path<String>,
) -> AppResult<Json<Value>> {
    let acting_user_id = session::require_user(&session).await?;
    end_match(&db_pool, &match_id, &acting_user_id).await?;
    Ok(Json(json!({ "message": "Match has been ended. Chat slot is now free." })))
}
