use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::put;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SetToken {
    pub token: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", put(set_token).delete(sign_out))
}

pub async fn set_token(
    State(state): State<AppState>,
    Json(input): Json<SetToken>,
) -> Result<StatusCode, AppError> {
    info!("PUT /session - Storing token");
    if input.token.trim().is_empty() {
        return Err(AppError::Validation("Token cannot be empty".into()));
    }
    state.session.set_token(input.token);
    state.session.save().map_err(|e| {
        error!("Failed to save session: {}", e);
        e
    })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn sign_out(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    info!("DELETE /session - Clearing token");
    state.session.clear();
    state.session.save()?;
    Ok(StatusCode::NO_CONTENT)
}
