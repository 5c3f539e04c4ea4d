use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use std::sync::Arc;

use super::AppState;
use crate::api::errors::ApiError;
use crate::api::models::PartialSuccessBody;
use crate::api::parsers::parse_match_request;
use crate::domain::MatchDetails;
use crate::errors::ServiceError;
use crate::services::MatchOutcome;

pub async fn get_matches(State(state): State<Arc<AppState>>) -> Result<Json<Vec<MatchDetails>>, ApiError> {
    let matches = state.matches.list_matches().await?;
    Ok(Json(matches))
}

pub async fn record_match(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let request = parse_match_request(&body)?;

    match state.matches.record_match(&request).await? {
        MatchOutcome::Success(details) => Ok(Json(details).into_response()),
        MatchOutcome::PartialSuccess { match_id, failed_steps } => Ok((
            StatusCode::MULTI_STATUS,
            Json(PartialSuccessBody::new(match_id, failed_steps)),
        )
            .into_response()),
        MatchOutcome::Abort { reason } => {
            Err(ServiceError::unavailable("Unable to record match", reason).into())
        }
    }
}
