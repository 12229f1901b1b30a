use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tower_sessions::Session;

use crate::{AppError, AppResult, models::Card, session};

/// Own profile, password hash excluded.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Profile {
    id: String,
    email: String,
    first_name: String,
    last_name: String,
    birth_date: DateTime<Utc>,
    bio: Option<String>,
    job_title: Option<String>,
    education: Option<String>,
    focus_slots_limit: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileResponse {
    #[serde(flatten)]
    profile: Profile,
    conversation_cards: Vec<Card>,
}

const PROFILE_COLUMNS: &str =
    "id, email, first_name, last_name, birth_date, bio, job_title, education, \
     focus_slots_limit, created_at";

#[axum::debug_handler]
pub(crate) async fn get_me(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<ProfileResponse>> {
    let user_id = session::require_user(&session).await?;

    let profile: Profile =
        sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id=?"))
            .bind(&user_id)
            .fetch_optional(&db_pool)
            .await?
            .ok_or(AppError::NotFound("User not found"))?;

    let conversation_cards: Vec<Card> = sqlx::query_as(
        "SELECT id, user_id, media_url, prompt_text, created_at \
         FROM conversation_cards WHERE user_id=? ORDER BY created_at",
    )
    .bind(&user_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(ProfileResponse { profile, conversation_cards }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateProfileBody {
    bio: Option<String>,
    job_title: Option<String>,
    education: Option<String>,
}

#[axum::debug_handler]
pub(crate) async fn update_me(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(UpdateProfileBody { bio, job_title, education }): Json<UpdateProfileBody>,
) -> AppResult<Json<Profile>> {
    let user_id = session::require_user(&session).await?;

    // Absent fields keep their current value.
    sqlx::query(
        "UPDATE users SET bio=COALESCE(?, bio), job_title=COALESCE(?, job_title), \
         education=COALESCE(?, education) WHERE id=?",
    )
    .bind(bio)
    .bind(job_title)
    .bind(education)
    .bind(&user_id)
    .execute(&db_pool)
    .await?;

    let profile: Profile =
        sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id=?"))
            .bind(&user_id)
            .fetch_optional(&db_pool)
            .await?
            .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(profile))
}
