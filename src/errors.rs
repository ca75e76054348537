use axum::http::StatusCode;
use axum::response::IntoResponse;
use thiserror::Error;

use crate::external::portfolio_store::StoreError;

#[derive(Debug, Error, PartialEq)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Remote error: {0}")]
    Remote(String),
    #[error("Session error: {0}")]
    Session(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::NotFound(symbol) => {
                let msg = format!("{} not found in portfolio", symbol);
                (StatusCode::NOT_FOUND, msg).into_response()
            }
            AppError::Remote(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            AppError::Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Remote(value.to_string())
    }
}
