mod list;
mod msg;
mod unmatch;

use axum::{Router, routing::{get, post}};

use crate::AppState;

pub use list::active_matches_for;
pub use msg::send_message;
pub use unmatch::end_match;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::active_matches))
        .route("/{match_id}/message", post(msg::send))
        .route("/{match_id}/unmatch", post(unmatch::unmatch))
}
