mod accept;
mod new;
mod pending;

use axum::{Router, routing::{get, post}};

use crate::AppState;

pub use accept::accept_icebreaker;
pub use new::create_icebreaker;
pub use pending::pending_for;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(pending::pending))
        .route("/{icebreaker_id}/accept", post(accept::accept))
}

/// Mounted under /api/v1/cards: sending an icebreaker is addressed at the
/// card it reacts to.
pub fn card_router() -> Router<AppState> {
    Router::new().route("/{card_id}/icebreaker", post(new::create))
}
