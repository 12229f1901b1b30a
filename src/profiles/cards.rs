use axum::{Json, extract::{Path, State}, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, models::Card, session};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateCardBody {
    media_url: String,
    prompt_text: String,
}

#[axum::debug_handler]
pub(crate) async fn create_card(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(CreateCardBody { media_url, prompt_text }): Json<CreateCardBody>,
) -> AppResult<(StatusCode, Json<Card>)> {
    let user_id = session::require_user(&session).await?;

    if !media_url.starts_with("http://") && !media_url.starts_with("https://") {
        return Err(AppError::Validation("mediaUrl must be a valid URL".to_owned()));
    }
    if prompt_text.chars().count() < 5 {
        return Err(AppError::Validation("promptText must be at least 5 characters".to_owned()));
    }

    let card = Card {
        id: Uuid::now_v7().to_string(),
        user_id,
        media_url,
        prompt_text,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO conversation_cards (id,user_id,media_url,prompt_text,created_at) \
         VALUES (?,?,?,?,?)",
    )
    .bind(&card.id)
    .bind(&card.user_id)
    .bind(&card.media_url)
    .bind(&card.prompt_text)
    .bind(card.created_at)
    .execute(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

#[axum::debug_handler]
pub(crate) async fn delete_card(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(card_id): Path<String>,
) -> AppResult<StatusCode> {
    let user_id = session::require_user(&session).await?;

    let deleted = sqlx::query("DELETE FROM conversation_cards WHERE id=? AND user_id=?")
        .bind(&card_id)
        .bind(&user_id)
        .execute(&db_pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound("Card not found or user unauthorized"));
    }

    Ok(StatusCode::NO_CONTENT)
}
