mod cards;
mod me;

use axum::{Router, routing::{delete, get, post}};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me::get_me).put(me::update_me))
        .route("/cards", post(cards::create_card))
        .route("/cards/{card_id}", delete(cards::delete_card))
}
