use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Holding;

/// One row of `GET /portfolio`. The service sends nulls plus an `error`
/// string when it could not price a symbol.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteHolding {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub shares: f64,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub percent_change: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RemoteHolding {
    /// Converts a priced record into a holding. Unpriced or malformed rows yield `None`.
    pub fn into_holding(self) -> Option<Holding> {
        if self.error.is_some() {
            return None;
        }
        let price = self.price.filter(|p| p.is_finite() && *p > 0.0)?;
        if !self.shares.is_finite() || self.shares <= 0.0 {
            return None;
        }
        let symbol = self.symbol.trim().to_uppercase();
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| symbol.clone());

        Some(Holding {
            symbol,
            name,
            shares: self.shares,
            price,
            change_percent: self.percent_change.filter(|p| p.is_finite()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct CashBalance {
    pub cash_balance: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewHoldingRequest {
    pub symbol: String,
    pub name: String,
    pub shares: f64,
}

/// Response of `POST /portfolio/add`; the price is resolved by the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatedHolding {
    #[serde(default)]
    pub id: Option<i64>,
    pub symbol: String,
    pub name: String,
    pub shares: f64,
    #[serde(alias = "price")]
    pub purchase_price: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateHoldingRequest {
    pub symbol: String,
    pub shares: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CashUpdateRequest {
    pub amount: f64,
}

/// `{ "detail": .. }` or `{ "message": .. }` acknowledgement bodies.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response ({status}): {message}")]
    BadResponse { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn fetch_holdings(&self) -> Result<Vec<RemoteHolding>, StoreError>;

    async fn fetch_cash(&self) -> Result<CashBalance, StoreError>;

    async fn add_holding(&self, request: NewHoldingRequest) -> Result<CreatedHolding, StoreError>;

    async fn remove_holding(&self, symbol: &str) -> Result<Acknowledgement, StoreError>;

    async fn update_holding(
        &self,
        request: UpdateHoldingRequest,
    ) -> Result<Acknowledgement, StoreError>;

    async fn adjust_cash(&self, request: CashUpdateRequest) -> Result<CashBalance, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpriced_rows_are_skipped() {
        let row: RemoteHolding = serde_json::from_str(
            r#"{"symbol":"zzz","name":"zzz","shares":3,"price":null,"change":null,
                "percent_change":null,"value":null,"error":"Invalid API call"}"#,
        )
        .unwrap();
        assert!(row.into_holding().is_none());
    }

    #[test]
    fn test_priced_row_becomes_holding() {
        let row: RemoteHolding = serde_json::from_str(
            r#"{"symbol":"aapl","name":"Apple Inc","shares":50,"price":150.0,
                "change":1.2,"percent_change":0.8,"value":7500.0}"#,
        )
        .unwrap();
        let h = row.into_holding().unwrap();
        assert_eq!(h.symbol, "AAPL");
        assert_eq!(h.change_percent, Some(0.8));
        assert_eq!(h.value(), 7500.0);
    }

    #[test]
    fn test_created_holding_accepts_price_alias() {
        let raw = r#"{"symbol":"MSFT","name":"Microsoft","shares":10,"price":300.5}"#;
        let c: CreatedHolding = serde_json::from_str(raw).unwrap();
        assert_eq!(c.purchase_price, 300.5);
        assert!(c.id.is_none());
    }
}
