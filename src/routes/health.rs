use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::debug;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub remote: bool,
    pub signed_in: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    debug!("GET /health - Health check");
    Json(HealthStatus {
        status: "OK",
        remote: state.portfolio.is_remote(),
        signed_in: state.session.token().is_some(),
    })
}
