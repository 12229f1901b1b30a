use axum::Json;
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::AppResult;

#[axum::debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Json<Value>> {
    session.clear().await;
    Ok(Json(json!({ "message": "Logged out" })))
}
