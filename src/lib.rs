pub mod auth;
pub mod db;
pub mod feed;
pub mod icebreakers;
pub mod matches;
pub mod models;
pub mod profiles;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

use std::str::FromStr;
use std::sync::Arc;

use axum::{Json, extract::FromRef, http::StatusCode, response::{IntoResponse, Response}};
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub admission: AdmissionLock,
}

/// Serializes match admission so that the focus-slot check and the
/// slot-consuming write are one decision. Without it, two accepts racing
/// through the check could jointly overshoot a user's limit.
#[derive(Clone, Default)]
pub struct AdmissionLock(Arc<Mutex<()>>);

impl AdmissionLock {
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Minimum icebreaker length, in characters.
    pub icebreaker_min_len: usize,
    /// Reply delay, in hours, after which a reply counts as ghosting.
    pub ghosting_hours_limit: i64,
    /// Focus slot limit assigned to new accounts.
    pub default_focus_slots: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            icebreaker_min_len: env_or("ICEBREAKER_MIN_LEN", 50),
            ghosting_hours_limit: env_or("GHOSTING_HOURS_LIMIT", 72),
            default_focus_slots: env_or("DEFAULT_FOCUS_SLOTS", 3),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            icebreaker_min_len: 50,
            ghosting_hours_limit: 72,
            default_focus_slots: 3,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("You cannot send an icebreaker to yourself")]
    InvalidTarget,
    #[error("You have already sent an icebreaker for this card")]
    Duplicate,
    #[error("This icebreaker has already been handled")]
    AlreadyHandled,
    #[error("{0}")]
    CapacityExceeded(String),
    // Also covers "exists but you may not touch it", so a probe can't
    // tell the two apart.
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidTarget | AppError::AlreadyHandled => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Duplicate | AppError::Conflict(_) | AppError::CapacityExceeded(_) => {
                StatusCode::CONFLICT
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(err) = &self {
            tracing::error!("internal error: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response();
        }

        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::Error);
apperr_impl!(bcrypt::BcryptError);
