use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, AppState, Config};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterBody {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    birth_date: String,
}

#[axum::debug_handler(state = AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(body): Json<RegisterBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let RegisterBody { email, password, first_name, last_name, birth_date } = body;

    if !email.contains('@') {
        return Err(AppError::Validation("email must be a valid email address".to_owned()));
    }
    if password.len() < 8 {
        return Err(AppError::Validation("password must be at least 8 characters".to_owned()));
    }
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::Validation("firstName and lastName must not be empty".to_owned()));
    }
    let birth_date: DateTime<Utc> = birth_date
        .parse()
        .map_err(|_| AppError::Validation("birthDate must be an ISO 8601 datetime".to_owned()))?;

    if sqlx::query("SELECT 1 FROM users WHERE email=?")
        .bind(&email)
        .fetch_optional(&db_pool)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("User with this email already exists"));
    }

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;
    let id = Uuid::now_v7();

    sqlx::query(
        "INSERT INTO users (id,email,password_hash,first_name,last_name,birth_date,focus_slots_limit,created_at) \
         VALUES (?,?,?,?,?,?,?,?)",
    )
    .bind(id.to_string())
    .bind(&email)
    .bind(&password_hash)
    .bind(&first_name)
    .bind(&last_name)
    .bind(birth_date)
    .bind(config.default_focus_slots)
    .bind(Utc::now())
    .execute(&db_pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "userId": id.to_string() })),
    ))
}
