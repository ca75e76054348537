//! In-process stand-in for the external portfolio service, serving the same
//! routes and body shapes on an ephemeral port.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct FakeHolding {
    pub symbol: String,
    pub name: String,
    pub shares: f64,
    pub price: Option<f64>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub holdings: Vec<FakeHolding>,
    pub quotes: HashMap<String, f64>,
    pub cash: f64,
    pub fail_writes: bool,
    pub fail_reads: bool,
    pub last_auth: Option<String>,
    pub cash_requests: Vec<f64>,
}

pub type Shared = Arc<Mutex<FakeState>>;

fn record_auth(state: &Shared, headers: &HeaderMap) {
    state.lock().last_auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
}

fn failure(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn list(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record_auth(&state, &headers);
    if state.lock().fail_reads {
        return failure(StatusCode::SERVICE_UNAVAILABLE, "database unavailable");
    }
    let rows: Vec<Value> = state
        .lock()
        .holdings
        .iter()
        .map(|h| match h.price {
            Some(price) => json!({
                "symbol": h.symbol,
                "name": h.name,
                "shares": h.shares,
                "price": price,
                "change": 1.0,
                "percent_change": 0.5,
                "value": h.shares * price,
            }),
            None => json!({
                "symbol": h.symbol,
                "name": h.symbol,
                "shares": h.shares,
                "price": null,
                "change": null,
                "percent_change": null,
                "value": null,
                "error": "Could not fetch quote",
            }),
        })
        .collect();
    Json(Value::Array(rows)).into_response()
}

async fn cash(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record_auth(&state, &headers);
    let s = state.lock();
    if s.fail_reads {
        return failure(StatusCode::SERVICE_UNAVAILABLE, "database unavailable");
    }
    Json(json!({ "cash_balance": s.cash })).into_response()
}

async fn add(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&state, &headers);
    let mut s = state.lock();
    if s.fail_writes {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let symbol = body["symbol"].as_str().unwrap_or_default().to_uppercase();
    let Some(price) = s.quotes.get(&symbol).copied() else {
        return failure(StatusCode::BAD_REQUEST, &format!("Unknown symbol {}", symbol));
    };
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let shares = body["shares"].as_f64().unwrap_or_default();
    s.holdings.push(FakeHolding {
        symbol: symbol.clone(),
        name: name.clone(),
        shares,
        price: Some(price),
    });
    let id = s.holdings.len();
    Json(json!({
        "id": id,
        "symbol": symbol,
        "name": name,
        "shares": shares,
        "purchase_price": price,
    }))
    .into_response()
}

async fn remove(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(symbol): Path<String>,
) -> Response {
    record_auth(&state, &headers);
    let mut s = state.lock();
    if s.fail_writes {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let symbol = symbol.to_uppercase();
    let before = s.holdings.len();
    s.holdings.retain(|h| h.symbol != symbol);
    if s.holdings.len() == before {
        return failure(StatusCode::NOT_FOUND, "Stock not found in portfolio");
    }
    Json(json!({ "detail": format!("{} removed from portfolio", symbol) })).into_response()
}

async fn update(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&state, &headers);
    let mut s = state.lock();
    if s.fail_writes {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let symbol = body["symbol"].as_str().unwrap_or_default().to_string();
    let Some(h) = s.holdings.iter_mut().find(|h| h.symbol == symbol) else {
        return failure(StatusCode::NOT_FOUND, "Stock not found in portfolio.");
    };
    h.shares = body["shares"].as_f64().unwrap_or_default();
    h.price = body["price"].as_f64();
    Json(json!({ "message": "Stock updated successfully" })).into_response()
}

async fn adjust_cash(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&state, &headers);
    let mut s = state.lock();
    if s.fail_writes {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let amount = body["amount"].as_f64().unwrap_or_default();
    s.cash_requests.push(amount);
    s.cash += amount;
    Json(json!({ "cash_balance": s.cash })).into_response()
}

pub fn router(state: Shared) -> Router {
    Router::new()
        .route("/portfolio", get(list))
        .route("/portfolio/cash", get(cash).post(adjust_cash))
        .route("/portfolio/add", post(add))
        .route("/portfolio/remove/:symbol", delete(remove))
        .route("/portfolio/update", put(update))
        .with_state(state)
}

/// Starts the fake service and returns its base URL.
pub async fn spawn_backend(state: FakeState) -> (String, Shared) {
    let shared: Shared = Arc::new(Mutex::new(state));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(shared.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), shared)
}

pub fn holding(symbol: &str, name: &str, shares: f64, price: f64) -> FakeHolding {
    FakeHolding {
        symbol: symbol.to_string(),
        name: name.to_string(),
        shares,
        price: Some(price),
    }
}
