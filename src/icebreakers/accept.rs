use axum::{Json, extract::{Path, State}, http::StatusCode};
use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AdmissionLock, AppError, AppResult, AppState, session};
use crate::models::{IcebreakerStatus, Match};

/// Turn a pending icebreaker into an active match.
///
/// Only the receiver may accept. Both participants must have a free focus
/// slot; the check and the slot-consuming writes run under the admission
/// lock and commit in one transaction, so concurrent accepts can never
/// leave a user over their limit or the ledger half-updated.
pub async fn accept_icebreaker(
    db_pool: &SqlitePool,
    admission: &AdmissionLock,
    icebreaker_id: &str,
    acting_user_id: &str,
) -> AppResult<Match> {
    let _guard = admission.acquire().await;
    let mut tx = db_pool.begin().await?;

    let Some((sender_id, receiver_id, status)): Option<(String, String, IcebreakerStatus)> =
        sqlx::query_as("SELECT sender_id, receiver_id, status FROM icebreakers WHERE id=?")
            .bind(icebreaker_id)
            .fetch_optional(&mut *tx)
            .await?
    else {
        return Err(AppError::NotFound("Icebreaker not found or you are not the receiver"));
    };

    if receiver_id != acting_user_id {
        return Err(AppError::NotFound("Icebreaker not found or you are not the receiver"));
    }
    if status != IcebreakerStatus::Pending {
        return Err(AppError::AlreadyHandled);
    }

    let (sender_first_name, sender_limit) = user_slots(&mut tx, &sender_id).await?;
    let (_, receiver_limit) = user_slots(&mut tx, &receiver_id).await?;

    let sender_active = active_match_count(&mut tx, &sender_id).await?;
    let receiver_active = active_match_count(&mut tx, &receiver_id).await?;

    if sender_active >= sender_limit {
        return Err(AppError::CapacityExceeded(format!(
            "{sender_first_name}'s chat slots are full."
        )));
    }
    if receiver_active >= receiver_limit {
        return Err(AppError::CapacityExceeded("Your chat slots are full.".to_owned()));
    }

    let new_match = Match {
        id: Uuid::now_v7().to_string(),
        user_a_id: sender_id,
        user_b_id: receiver_id,
        is_active: true,
        created_at: Utc::now(),
    };

    sqlx::query("INSERT INTO matches (id,user_a_id,user_b_id,is_active,created_at) VALUES (?,?,?,1,?)")
        .bind(&new_match.id)
        .bind(&new_match.user_a_id)
        .bind(&new_match.user_b_id)
        .bind(new_match.created_at)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE icebreakers SET status='ACCEPTED' WHERE id=?")
        .bind(icebreaker_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(new_match)
}

async fn user_slots(conn: &mut SqliteConnection, user_id: &str) -> AppResult<(String, i64)> {
    sqlx::query_as("SELECT first_name, focus_slots_limit FROM users WHERE id=?")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound("User not found"))
}

// Recomputed on demand rather than cached; the matches table is the single
// source of truth for slot usage.
async fn active_match_count(conn: &mut SqliteConnection, user_id: &str) -> AppResult<i64> {
    let (n,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM matches WHERE is_active=1 AND (user_a_id=? OR user_b_id=?)",
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(n)
}

#[derive(Debug, Serialize)]
pub(crate) struct AcceptResponse {
    message: &'static str,
    r#match: Match,
}

#[axum::debug_handler(state = AppState)]
pub(crate) async fn accept(
    State(db_pool): State<SqlitePool>,
    State(admission): State<AdmissionLock>,
    session: Session,
    Path(icebreaker_id): Path<String>,
) -> AppResult<(StatusCode, Json<AcceptResponse>)> {
    let acting_user_id = session::require_user(&session).await?;
    let new_match =
        accept_icebreaker(&db_pool, &admission, &icebreaker_id, &acting_user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(AcceptResponse {
            message: "Icebreaker accepted! You have a new match.",
            r#match: new_match,
        }),
    ))
}
