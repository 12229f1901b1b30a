use axum::{Json, extract::{Path, State}, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, AppState, Config, models::Message, session};

/// Append a message to an active match the sender participates in.
///
/// A reply arriving past the ghosting threshold is logged and nothing more;
/// detection never blocks delivery.
pub async fn send_message(
    db_pool: &SqlitePool,
    config: &Config,
    match_id: &str,
    sender_id: &str,
    content: &str,
) -> AppResult<Message> {
    if content.is_empty() {
        return Err(AppError::Validation("content must not be empty".to_owned()));
    }

    if sqlx::query(
        "SELECT 1 FROM matches WHERE id=? AND is_active=1 AND (user_a_id=? OR user_b_id=?)",
    )
    .bind(match_id)
    .bind(sender_id)
    .bind(sender_id)
    .fetch_optional(db_pool)
    .await?
    .is_none()
    {
        return Err(AppError::NotFound("Active match not found or you are not a participant"));
    }

    let last: Option<(String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT sender_id, created_at FROM messages WHERE match_id=? \
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(match_id)
    .fetch_optional(db_pool)
    .await?;

    if let Some((last_sender, last_created_at)) = last
        && last_sender != sender_id
    {
        let hours_since = (Utc::now() - last_created_at).num_hours();
        if hours_since > config.ghosting_hours_limit {
            tracing::warn!(
                match_id,
                sender_id,
                hours_since,
                "reply arrived past the ghosting threshold"
            );
        }
    }

    let message = Message {
        id: Uuid::now_v7().to_string(),
        match_id: match_id.to_owned(),
        sender_id: sender_id.to_owned(),
        content: content.to_owned(),
        created_at: Utc::now(),
    };

    sqlx::query("INSERT INTO messages (id,match_id,sender_id,content,created_at) VALUES (?,?,?,?,?)")
        .bind(&message.id)
        .bind(&message.match_id)
        .bind(&message.sender_id)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(db_pool)
        .await?;

    Ok(message)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageBody {
    content: String,
}

#[axum::debug_handler(state = AppState)]
pub(crate) async fn send(
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    session: Session,
    Path(match_id): Path<String>,
    Json(SendMessageBody { content }): Json<SendMessageBody>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let sender_id = session::require_user(&session).await?;
    let message = send_message(&db_pool, &config, &match_id, &sender_id, &content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::testutil::{seed_match, seed_user, test_pool};

    #[tokio::test]
    async fn participants_can_exchange_messages() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        seed_user(&pool, "a", "Ada", 3).await;
        seed_user(&pool, "b", "Ben", 3).await;
        seed_match(&pool, "m-1", "a", "b").await;

        let first = send_message(&pool, &config, "m-1", "a", "hey, nice card!")
            .await
            .expect("first message");
        assert_eq!(first.match_id, "m-1");
        assert_eq!(first.sender_id, "a");

        send_message(&pool, &config, "m-1", "b", "thanks!")
            .await
            .expect("reply");

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE match_id='m-1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn rejects_empty_content() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        seed_user(&pool, "a", "Ada", 3).await;
        seed_user(&pool, "b", "Ben", 3).await;
        seed_match(&pool, "m-1", "a", "b").await;

        let err = send_message(&pool, &config, "m-1", "a", "")
            .await
            .expect_err("empty content must fail");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn non_participant_gets_not_found() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        seed_user(&pool, "a", "Ada", 3).await;
        seed_user(&pool, "b", "Ben", 3).await;
        seed_match(&pool, "m-1", "a", "b").await;

        let err = send_message(&pool, &config, "m-1", "stranger", "hi")
            .await
            .expect_err("non-participant must fail");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn inactive_match_gets_not_found_even_for_former_participant() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        seed_user(&pool, "a", "Ada", 3).await;
        seed_user(&pool, "b", "Ben", 3).await;
        seed_match(&pool, "m-1", "a", "b").await;
        sqlx::query("UPDATE matches SET is_active=0 WHERE id='m-1'")
            .execute(&pool)
            .await
            .unwrap();

        let err = send_message(&pool, &config, "m-1", "a", "anyone there?")
            .await
            .expect_err("inactive match must fail");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn late_reply_is_still_delivered() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        seed_user(&pool, "a", "Ada", 3).await;
        seed_user(&pool, "b", "Ben", 3).await;
        seed_match(&pool, "m-1", "a", "b").await;

        // A message from the other party, well past the threshold.
        sqlx::query("INSERT INTO messages (id,match_id,sender_id,content,created_at) VALUES (?,?,?,?,?)")
            .bind("old-msg")
            .bind("m-1")
            .bind("a")
            .bind("hello?")
            .bind(Utc::now() - Duration::hours(100))
            .execute(&pool)
            .await
            .unwrap();

        send_message(&pool, &config, "m-1", "b", "sorry, busy week")
            .await
            .expect("ghosting detection must not block delivery");
    }
}
