use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::{error, warn};
use std::any::Any;
use thiserror::Error;

use super::models::ErrorBody;
use crate::errors::{ServiceError, ValidationError};

const INTERNAL_ERROR: &str = "Unable to process your request at this time";

/// Everything a handler can fail with. Only user-safe messages reach the body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request format")]
    InvalidFormat(#[from] JsonRejection),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidFormat(rejection) => {
                warn!("Rejected request body: {}", rejection.body_text());
                (StatusCode::BAD_REQUEST, "Invalid request format".to_string())
            }
            ApiError::Invalid(e) | ApiError::Service(ServiceError::InvalidInput(e)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Service(ServiceError::Conflict(message)) => (StatusCode::CONFLICT, message.to_string()),
            ApiError::Service(ServiceError::Unavailable { message, source }) => {
                error!("{}: {:?}", message, source);
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Last resort for a handler that panicked
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Unexpected error while handling request: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new(INTERNAL_ERROR)),
    )
        .into_response()
}
