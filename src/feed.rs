use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, AppState, models::Card, session};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(feed))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeedCard {
    #[serde(flatten)]
    card: Card,
    user: CardOwner,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CardOwner {
    id: String,
    first_name: String,
    last_name: String,
    job_title: Option<String>,
    education: Option<String>,
}

// Unfiltered reverse-chronological feed: everyone else's cards, newest first.
#[axum::debug_handler]
pub(crate) async fn feed(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Vec<FeedCard>>> {
    let user_id = session::require_user(&session).await?;

    type Row = (
        String,
        String,
        String,
        String,
        DateTime<Utc>,
        String,
        String,
        Option<String>,
        Option<String>,
    );
    let rows: Vec<Row> = sqlx::query_as(
        "SELECT c.id, c.user_id, c.media_url, c.prompt_text, c.created_at, \
                u.first_name, u.last_name, u.job_title, u.education \
         FROM conversation_cards c \
         JOIN users u ON u.id = c.user_id \
         WHERE c.user_id <> ? \
         ORDER BY c.created_at DESC \
         LIMIT 50",
    )
    .bind(&user_id)
    .fetch_all(&db_pool)
    .await?;

    let cards = rows
        .into_iter()
        .map(
            |(id, owner_id, media_url, prompt_text, created_at, first_name, last_name, job_title, education)| {
                FeedCard {
                    card: Card {
                        id,
                        user_id: owner_id.clone(),
                        media_url,
                        prompt_text,
                        created_at,
                    },
                    user: CardOwner { id: owner_id, first_name, last_name, job_title, education },
                }
            },
        )
        .collect();

    Ok(Json(cards))
}
