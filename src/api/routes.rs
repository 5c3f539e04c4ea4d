use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::errors::handle_panic;
use crate::api::handlers::{
    matches::{get_matches, record_match},
    players::{create_player, get_players},
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/players", get(get_players).post(create_player))
        .route("/api/matches", get(get_matches).post(record_match))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}
