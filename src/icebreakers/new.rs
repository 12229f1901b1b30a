use axum::{Json, extract::{Path, State}, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, AppState, Config, session};
use crate::models::{Icebreaker, IcebreakerStatus};

/// Record a one-directional opener from `sender_id` against someone else's
/// card. The receiver is whoever owns the card.
pub async fn create_icebreaker(
    db_pool: &SqlitePool,
    config: &Config,
    sender_id: &str,
    target_card_id: &str,
    content: &str,
) -> AppResult<Icebreaker> {
    if content.chars().count() < config.icebreaker_min_len {
        return Err(AppError::Validation(format!(
            "content must be at least {} characters",
            config.icebreaker_min_len
        )));
    }

    let Some((receiver_id,)): Option<(String,)> =
        sqlx::query_as("SELECT user_id FROM conversation_cards WHERE id=?")
            .bind(target_card_id)
            .fetch_optional(db_pool)
            .await?
    else {
        return Err(AppError::NotFound("Target card not found"));
    };

    if receiver_id == sender_id {
        return Err(AppError::InvalidTarget);
    }

    // One icebreaker per (sender, card), ever: a prior record blocks a new
    // one regardless of its status.
    if sqlx::query("SELECT 1 FROM icebreakers WHERE sender_id=? AND target_card_id=?")
        .bind(sender_id)
        .bind(target_card_id)
        .fetch_optional(db_pool)
        .await?
        .is_some()
    {
        return Err(AppError::Duplicate);
    }

    let icebreaker = Icebreaker {
        id: Uuid::now_v7().to_string(),
        sender_id: sender_id.to_owned(),
        receiver_id,
        target_card_id: target_card_id.to_owned(),
        content: content.to_owned(),
        status: IcebreakerStatus::Pending,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO icebreakers (id,sender_id,receiver_id,target_card_id,content,status,created_at) \
         VALUES (?,?,?,?,?,?,?)",
    )
    .bind(&icebreaker.id)
    .bind(&icebreaker.sender_id)
    .bind(&icebreaker.receiver_id)
    .bind(&icebreaker.target_card_id)
    .bind(&icebreaker.content)
    .bind(icebreaker.status)
    .bind(icebreaker.created_at)
    .execute(db_pool)
    .await?;

    Ok(icebreaker)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateIcebreakerBody {
    content: String,
}

#[axum::debug_handler(state = AppState)]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    session: Session,
    Path(card_id): Path<String>,
    Json(CreateIcebreakerBody { content }): Json<CreateIcebreakerBody>,
) -> AppResult<(StatusCode, Json<Icebreaker>)> {
    let sender_id = session::require_user(&session).await?;
    let icebreaker = create_icebreaker(&db_pool, &config, &sender_id, &card_id, &content).await?;
    Ok((StatusCode::CREATED, Json(icebreaker)))
}
