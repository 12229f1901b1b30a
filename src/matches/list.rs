use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tower_sessions::Session;

use crate::{AppResult, models::{Match, Message}, session};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchWithPreview {
    #[serde(flatten)]
    pub r#match: Match,
    pub user_a: Participant,
    pub user_b: Participant,
    pub last_message: Option<Message>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub first_name: String,
}

#[derive(FromRow)]
struct MatchRow {
    id: String,
    user_a_id: String,
    user_b_id: String,
    created_at: DateTime<Utc>,
    user_a_first_name: String,
    user_b_first_name: String,
}

/// Active matches for `user_id`, each with both participants' first names
/// and a one-message preview of the conversation.
pub async fn active_matches_for(
    db_pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Vec<MatchWithPreview>> {
    let rows: Vec<MatchRow> = sqlx::query_as(
        "SELECT m.id, m.user_a_id, m.user_b_id, m.created_at, \
                ua.first_name AS user_a_first_name, ub.first_name AS user_b_first_name \
         FROM matches m \
         JOIN users ua ON ua.id = m.user_a_id \
         JOIN users ub ON ub.id = m.user_b_id \
         WHERE m.is_active=1 AND (m.user_a_id=? OR m.user_b_id=?) \
         ORDER BY m.created_at",
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;

    let mut matches = Vec::with_capacity(rows.len());
    for row in rows {
        let last_message: Option<Message> = sqlx::query_as(
            "SELECT id, match_id, sender_id, content, created_at FROM messages \
             WHERE match_id=? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(&row.id)
        .fetch_optional(db_pool)
        .await?;

        matches.push(MatchWithPreview {
            user_a: Participant { id: row.user_a_id.clone(), first_name: row.user_a_first_name },
            user_b: Participant { id: row.user_b_id.clone(), first_name: row.user_b_first_name },
            r#match: Match {
                id: row.id,
                user_a_id: row.user_a_id,
                user_b_id: row.user_b_id,
                is_active: true,
                created_at: row.created_at,
            },
            last_message,
        });
    }

    Ok(matches)
}

#[axum::debug_handler]
pub(crate) async fn active_matches(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Vec<MatchWithPreview>>> {
    let user_id = session::require_user(&session).await?;
    Ok(Json(active_matches_for(&db_pool, &user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::matches::send_message;
    use crate::testutil::{seed_match, seed_user, test_pool};

    #[tokio::test]
    async fn lists_active_matches_with_latest_preview() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        seed_user(&pool, "a", "Ada", 3).await;
        seed_user(&pool, "b", "Ben", 3).await;
        seed_user(&pool, "c", "Cleo", 3).await;
        seed_match(&pool, "m-ab", "a", "b").await;
        seed_match(&pool, "m-bc", "b", "c").await;

        send_message(&pool, &config, "m-ab", "a", "first").await.unwrap();
        send_message(&pool, &config, "m-ab", "b", "second").await.unwrap();

        let for_a = active_matches_for(&pool, "a").await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].r#match.id, "m-ab");
        assert_eq!(for_a[0].user_b.first_name, "Ben");
        assert_eq!(for_a[0].last_message.as_ref().unwrap().content, "second");

        let for_b = active_matches_for(&pool, "b").await.unwrap();
        assert_eq!(for_b.len(), 2);
        assert!(for_b[1].last_message.is_none());
    }

    #[tokio::test]
    async fn ended_matches_are_not_listed() {
        let pool = test_pool().await;
        seed_user(&pool, "a", "Ada", 3).await;
        seed_user(&pool, "b", "Ben", 3).await;
        seed_match(&pool, "m-ab", "a", "b").await;
        sqlx::query("UPDATE matches SET is_active=0 WHERE id='m-ab'")
            .execute(&pool)
            .await
            .unwrap();

        assert!(active_matches_for(&pool, "a").await.unwrap().is_empty());
    }
}
