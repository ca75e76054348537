use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,11}$").expect("valid symbol pattern"));

/// A single stock position held in the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub shares: f64,
    pub price: f64,
    /// Display-only daily move, in percent. Supplied by the remote service or mocked.
    pub change_percent: Option<f64>,
}

impl Holding {
    pub fn value(&self) -> f64 {
        self.shares * self.price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHolding {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub shares: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateHolding {
    pub shares: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCash {
    pub amount: f64,
}

/// Trims and upper-cases a ticker, rejecting anything that doesn't look like one.
pub fn normalize_symbol(symbol: &str) -> Result<String, AppError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("Symbol cannot be empty".into()));
    }
    if !SYMBOL_RE.is_match(&symbol) {
        return Err(AppError::Validation(format!("Invalid symbol: {}", symbol)));
    }
    Ok(symbol)
}

pub fn validate_quantities(shares: f64, price: f64) -> Result<(), AppError> {
    if !shares.is_finite() || shares <= 0.0 {
        return Err(AppError::Validation("Shares must be > 0".into()));
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::Validation("Price must be > 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_is_trimmed_and_uppercased() {
        assert_eq!(normalize_symbol("  aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
    }

    #[test]
    fn test_symbol_rejects_empty_and_garbage() {
        assert!(matches!(normalize_symbol("   "), Err(AppError::Validation(_))));
        assert!(matches!(normalize_symbol("AA PL"), Err(AppError::Validation(_))));
        assert!(matches!(normalize_symbol("ABCDEFGHIJKLMNOP"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_quantities_must_be_positive_and_finite() {
        assert!(validate_quantities(0.5, 10.0).is_ok());
        assert!(validate_quantities(0.0, 10.0).is_err());
        assert!(validate_quantities(1.0, -1.0).is_err());
        assert!(validate_quantities(f64::NAN, 1.0).is_err());
        assert!(validate_quantities(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_value_is_shares_times_price() {
        let h = Holding {
            symbol: "AAPL".into(),
            name: "Apple Inc.".into(),
            shares: 50.0,
            price: 150.0,
            change_percent: None,
        };
        assert_eq!(h.value(), 7500.0);
    }
}
