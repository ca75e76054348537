use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{CreateHolding, Holding, PortfolioView, UpdateCash, UpdateHolding};
use crate::services::portfolio_service::RefreshReport;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CashBalanceResponse {
    pub cash_balance: f64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_portfolio))
        .route("/holdings", post(add_holding).delete(clear_holdings))
        .route("/holdings/:symbol", put(update_holding).delete(remove_holding))
        .route("/cash", put(set_cash))
        .route("/refresh", post(refresh))
}

pub async fn get_portfolio(State(state): State<AppState>) -> Json<PortfolioView> {
    info!("GET /portfolio - Fetching portfolio view");
    Json(state.portfolio.view())
}

pub async fn add_holding(
    State(state): State<AppState>,
    Json(input): Json<CreateHolding>,
) -> Result<(StatusCode, Json<Holding>), AppError> {
    info!("POST /portfolio/holdings - Adding {}", input.symbol);
    let symbol = input.symbol.clone();
    let holding = state.portfolio.add_holding(input).await.map_err(|e| {
        error!("Failed to add {}: {}", symbol, e);
        e
    })?;
    Ok((StatusCode::CREATED, Json(holding)))
}

pub async fn update_holding(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Json(input): Json<UpdateHolding>,
) -> Result<Json<Holding>, AppError> {
    info!("PUT /portfolio/holdings/{} - Updating holding", symbol);
    let holding = state
        .portfolio
        .update_holding(&symbol, input)
        .await
        .map_err(|e| {
            error!("Failed to update {}: {}", symbol, e);
            e
        })?;
    Ok(Json(holding))
}

pub async fn remove_holding(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /portfolio/holdings/{} - Removing holding", symbol);
    state.portfolio.remove_holding(&symbol).await.map_err(|e| {
        error!("Failed to remove {}: {}", symbol, e);
        e
    })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_holdings(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    info!("DELETE /portfolio/holdings - Clearing portfolio");
    state.portfolio.clear().await.map_err(|e| {
        error!("Failed to clear portfolio: {}", e);
        e
    })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_cash(
    State(state): State<AppState>,
    Json(input): Json<UpdateCash>,
) -> Result<Json<CashBalanceResponse>, AppError> {
    info!("PUT /portfolio/cash - Setting cash balance to {}", input.amount);
    let cash_balance = state
        .portfolio
        .set_cash_balance(input.amount)
        .await
        .map_err(|e| {
            error!("Failed to set cash balance: {}", e);
            e
        })?;
    Ok(Json(CashBalanceResponse { cash_balance }))
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshReport>, AppError> {
    info!("POST /portfolio/refresh - Reloading from remote");
    let report = state.portfolio.refresh().await.map_err(|e| {
        error!("Failed to refresh portfolio: {}", e);
        e
    })?;
    Ok(Json(report))
}
