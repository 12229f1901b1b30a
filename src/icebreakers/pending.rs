use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tower_sessions::Session;

use crate::{AppResult, session};
use crate::models::{Card, Icebreaker, IcebreakerStatus, PublicUser};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingIcebreaker {
    #[serde(flatten)]
    pub icebreaker: Icebreaker,
    pub sender: PublicUser,
    pub target_card: Card,
}

#[derive(FromRow)]
struct PendingRow {
    id: String,
    sender_id: String,
    receiver_id: String,
    target_card_id: String,
    content: String,
    created_at: DateTime<Utc>,
    sender_first_name: String,
    sender_last_name: String,
    card_media_url: String,
    card_prompt_text: String,
    card_created_at: DateTime<Utc>,
}

/// Pending icebreakers aimed at `receiver_id`, oldest first, joined with
/// the sender's public identity and the card they reacted to.
pub async fn pending_for(
    db_pool: &SqlitePool,
    receiver_id: &str,
) -> AppResult<Vec<PendingIcebreaker>> {
    let rows: Vec<PendingRow> = sqlx::query_as(
        "SELECT i.id, i.sender_id, i.receiver_id, i.target_card_id, i.content, i.created_at, \
                u.first_name AS sender_first_name, u.last_name AS sender_last_name, \
                c.media_url AS card_media_url, c.prompt_text AS card_prompt_text, \
                c.created_at AS card_created_at \
         FROM icebreakers i \
         JOIN users u ON u.id = i.sender_id \
         JOIN conversation_cards c ON c.id = i.target_card_id \
         WHERE i.receiver_id=? AND i.status='PENDING' \
         ORDER BY i.created_at",
    )
    .bind(receiver_id)
    .fetch_all(db_pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| PendingIcebreaker {
            sender: PublicUser {
                id: row.sender_id.clone(),
                first_name: row.sender_first_name,
                last_name: row.sender_last_name,
            },
            target_card: Card {
                id: row.target_card_id.clone(),
                user_id: row.receiver_id.clone(),
                media_url: row.card_media_url,
                prompt_text: row.card_prompt_text,
                created_at: row.card_created_at,
            },
            icebreaker: Icebreaker {
                id: row.id,
                sender_id: row.sender_id,
                receiver_id: row.receiver_id,
                target_card_id: row.target_card_id,
                content: row.content,
                status: IcebreakerStatus::Pending,
                created_at: row.created_at,
            },
        })
        .collect())
}

#[axum::debug_handler]
pub(crate) async fn pending(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Vec<PendingIcebreaker>>> {
    let receiver_id = session::require_user(&session).await?;
    Ok(Json(pending_for(&db_pool, &receiver_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::icebreakers::create_icebreaker;
    use crate::testutil::{long_content, seed_card, seed_user, test_pool};

    #[tokio::test]
    async fn lists_only_pending_for_receiver_in_insertion_order() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        seed_user(&pool, "a", "Ada", 3).await;
        seed_user(&pool, "b", "Ben", 3).await;
        seed_user(&pool, "c", "Cleo", 3).await;
        seed_card(&pool, "card-b", "b").await;
        seed_card(&pool, "card-c", "c").await;

        let first = create_icebreaker(&pool, &config, "a", "card-b", &long_content())
            .await
            .unwrap();
        let second = create_icebreaker(&pool, &config, "c", "card-b", &long_content())
            .await
            .unwrap();
        // Aimed at someone else; must not show up for b.
        create_icebreaker(&pool, &config, "a", "card-c", &long_content())
            .await
            .unwrap();

        // Handled ones disappear from the list.
        sqlx::query("UPDATE icebreakers SET status='ACCEPTED' WHERE id=?")
            .bind(&first.id)
            .execute(&pool)
            .await
            .unwrap();

        let pending = pending_for(&pool, "b").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].icebreaker.id, second.id);
        assert_eq!(pending[0].sender.first_name, "Cleo");
        assert_eq!(pending[0].target_card.id, "card-b");
    }

    #[tokio::test]
    async fn joins_sender_identity_and_card() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        seed_user(&pool, "a", "Ada", 3).await;
        seed_user(&pool, "b", "Ben", 3).await;
        seed_card(&pool, "card-b", "b").await;

        create_icebreaker(&pool, &config, "a", "card-b", &long_content())
            .await
            .unwrap();

        let pending = pending_for(&pool, "b").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sender.id, "a");
        assert_eq!(pending[0].icebreaker.status, IcebreakerStatus::Pending);
        assert_eq!(pending[0].target_card.user_id, "b");
    }
}
