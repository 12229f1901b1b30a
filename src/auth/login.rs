use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, session::USER_ID};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    email: String,
    password: String,
}

#[axum::debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(LoginBody { email, password }): Json<LoginBody>,
) -> AppResult<Json<Value>> {
    let Some((user_id, password_hash)): Option<(String, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email=?")
            .bind(&email)
            .fetch_optional(&db_pool)
            .await?
    else {
        return Err(AppError::Unauthorized("Invalid credentials"));
    };

    if !bcrypt::verify(&password, &password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    session.insert(USER_ID, user_id.clone()).await?;

    Ok(Json(json!({ "message": "Logged in successfully", "userId": user_id })))
}
