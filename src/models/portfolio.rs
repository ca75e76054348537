use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::holding::{normalize_symbol, validate_quantities, Holding};

/// In-memory snapshot of holdings and cash for the current view.
///
/// Holdings keep insertion order and are keyed by their (uppercase) symbol.
/// Totals and allocations are derived on demand and never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    holdings: Vec<Holding>,
    cash_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub symbol: String,
    pub value: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_value: f64,
    pub cash_balance: f64,
    pub cash_allocation: f64,
    pub allocations: Vec<Allocation>,
}

impl PortfolioTotals {
    pub fn allocation_of(&self, symbol: &str) -> Option<f64> {
        self.allocations
            .iter()
            .find(|a| a.symbol == symbol)
            .map(|a| a.percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayChange {
    pub current_total_value: f64,
    pub days_change_value: f64,
    pub days_change_percent: f64,
}

/// A holding as the dashboard table shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingView {
    pub symbol: String,
    pub name: String,
    pub shares: f64,
    pub price: f64,
    pub value: f64,
    pub change_percent: Option<f64>,
    pub allocation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub holdings: Vec<HoldingView>,
    pub cash_balance: f64,
    pub cash_allocation: f64,
    pub total_value: f64,
    pub day_change: DayChange,
}

fn percent_of(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn validate_cash(amount: f64) -> Result<(), AppError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::Validation("Cash balance cannot be negative".into()));
    }
    Ok(())
}

impl Portfolio {
    pub fn new(cash_balance: f64) -> Result<Self, AppError> {
        validate_cash(cash_balance)?;
        Ok(Self {
            holdings: Vec::new(),
            cash_balance,
        })
    }

    /// Folds a resolved row into the snapshot. A symbol that is already held
    /// gains the row's shares and keeps its first price and name. Returns
    /// `true` when the row was merged into an existing holding.
    pub fn merge_holding(&mut self, holding: Holding) -> Result<bool, AppError> {
        let symbol = normalize_symbol(&holding.symbol)?;
        validate_quantities(holding.shares, holding.price)?;
        if let Some(idx) = self.position(&symbol) {
            self.holdings[idx].shares += holding.shares;
            return Ok(true);
        }

        let added = self.add_holding(&symbol, &holding.name, holding.shares, holding.price)?;
        self.set_change_percent(&added.symbol, holding.change_percent);
        Ok(false)
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn cash_balance(&self) -> f64 {
        self.cash_balance
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&Holding> {
        let symbol = symbol.trim().to_uppercase();
        self.holdings.iter().find(|h| h.symbol == symbol)
    }

    fn position(&self, symbol: &str) -> Option<usize> {
        self.holdings.iter().position(|h| h.symbol == symbol)
    }

    pub fn add_holding(
        &mut self,
        symbol: &str,
        name: &str,
        shares: f64,
        price: f64,
    ) -> Result<Holding, AppError> {
        let symbol = normalize_symbol(symbol)?;
        validate_quantities(shares, price)?;
        if self.position(&symbol).is_some() {
            return Err(AppError::Validation(format!("{} is already in the portfolio", symbol)));
        }

        let name = match name.trim() {
            "" => symbol.clone(),
            n => n.to_string(),
        };
        let holding = Holding {
            symbol,
            name,
            shares,
            price,
            change_percent: None,
        };
        self.holdings.push(holding.clone());
        Ok(holding)
    }

    /// Removes the holding if present. Returns it with its former index so it can be put back.
    pub fn remove_holding(&mut self, symbol: &str) -> Option<(usize, Holding)> {
        let symbol = symbol.trim().to_uppercase();
        let idx = self.position(&symbol)?;
        Some((idx, self.holdings.remove(idx)))
    }

    pub fn update_holding(
        &mut self,
        symbol: &str,
        shares: f64,
        price: f64,
    ) -> Result<Holding, AppError> {
        validate_quantities(shares, price)?;
        let symbol = symbol.trim().to_uppercase();
        let idx = self
            .position(&symbol)
            .ok_or_else(|| AppError::NotFound(symbol.clone()))?;

        let holding = &mut self.holdings[idx];
        holding.shares = shares;
        holding.price = price;
        Ok(holding.clone())
    }

    pub fn set_cash_balance(&mut self, amount: f64) -> Result<(), AppError> {
        validate_cash(amount)?;
        self.cash_balance = amount;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.holdings.clear();
    }

    pub(crate) fn set_change_percent(&mut self, symbol: &str, change_percent: Option<f64>) {
        if let Some(h) = self.holdings.iter_mut().find(|h| h.symbol == symbol) {
            h.change_percent = change_percent;
        }
    }

    pub(crate) fn set_name(&mut self, symbol: &str, name: &str) {
        if let Some(h) = self.holdings.iter_mut().find(|h| h.symbol == symbol) {
            if !name.trim().is_empty() {
                h.name = name.trim().to_string();
            }
        }
    }

    /// Puts a previously removed holding back at `index` (clamped), unless the
    /// symbol is held again.
    pub(crate) fn restore_holding(&mut self, index: usize, holding: Holding) {
        if self.position(&holding.symbol).is_some() {
            return;
        }
        let index = index.min(self.holdings.len());
        self.holdings.insert(index, holding);
    }

    pub fn total_value(&self) -> f64 {
        self.cash_balance + self.holdings.iter().map(Holding::value).sum::<f64>()
    }

    pub fn compute_totals(&self) -> PortfolioTotals {
        let total_value = self.total_value();
        let allocations = self
            .holdings
            .iter()
            .map(|h| {
                let value = h.value();
                Allocation {
                    symbol: h.symbol.clone(),
                    value,
                    percent: percent_of(value, total_value),
                }
            })
            .collect();

        PortfolioTotals {
            total_value,
            cash_balance: self.cash_balance,
            cash_allocation: percent_of(self.cash_balance, total_value),
            allocations,
        }
    }

    pub fn allocation_of(&self, symbol: &str) -> Option<f64> {
        self.get(symbol)
            .map(|h| percent_of(h.value(), self.total_value()))
    }

    pub fn view(&self) -> PortfolioView {
        let totals = self.compute_totals();
        let holdings = self
            .holdings
            .iter()
            .zip(totals.allocations.iter())
            .map(|(h, a)| HoldingView {
                symbol: h.symbol.clone(),
                name: h.name.clone(),
                shares: h.shares,
                price: h.price,
                value: a.value,
                change_percent: h.change_percent,
                allocation: a.percent,
            })
            .collect();

        PortfolioView {
            holdings,
            cash_balance: totals.cash_balance,
            cash_allocation: totals.cash_allocation,
            total_value: totals.total_value,
            day_change: self.day_change(),
        }
    }

    /// Today's move implied by each holding's change percent.
    /// Holdings without a change percent are valued but contribute no change.
    pub fn day_change(&self) -> DayChange {
        let current = self.total_value();
        let change: f64 = self
            .holdings
            .iter()
            .filter_map(|h| {
                let pct = h.change_percent?;
                let factor = 1.0 + pct / 100.0;
                if factor <= 0.0 {
                    return None;
                }
                let value = h.value();
                Some(value - value / factor)
            })
            .sum();
        let previous = current - change;

        DayChange {
            current_total_value: round2(current),
            days_change_value: round2(change),
            days_change_percent: round2(percent_of(change, previous)),
        }
    }
}
