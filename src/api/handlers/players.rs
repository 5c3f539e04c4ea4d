use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::AppState;
use crate::api::errors::ApiError;
use crate::api::parsers::parse_player_request;
use crate::domain::Player;

pub async fn get_players(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Player>>, ApiError> {
    let players = state.players.list().await?;
    Ok(Json(players))
}

pub async fn create_player(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Player>, ApiError> {
    let Json(body) = payload?;
    let request = parse_player_request(&body)?;

    let player = state.players.create(&request.name, &request.email).await?;
    Ok(Json(player))
}
