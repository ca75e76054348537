use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::CashUpdateMode;
use crate::errors::AppError;
use crate::external::portfolio_store::{
    CashBalance, CashUpdateRequest, NewHoldingRequest, PortfolioStore, StoreError,
    UpdateHoldingRequest,
};
use crate::models::{CreateHolding, Holding, Portfolio, PortfolioView, UpdateHolding};

/// Applies user actions to the in-memory portfolio and reconciles them with the
/// remote store, if one is configured.
///
/// Every mutation is applied locally first. The lock is released before the
/// remote call and re-taken to adopt the service's answer or to undo the
/// local change when the call fails.
pub struct PortfolioService {
    portfolio: Mutex<Portfolio>,
    store: Option<Arc<dyn PortfolioStore>>,
    cash_mode: CashUpdateMode,
    mock_changes: bool,
    // Whether the local cash balance is known to match the remote one.
    cash_synced: AtomicBool,
}

/// Remote rows that did not make it into the snapshot as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Rows the service could not price.
    pub unpriced: Vec<String>,
    /// Rows rejected by symbol or quantity validation.
    pub invalid: Vec<String>,
    /// Symbols that appeared more than once; their shares were summed.
    pub merged: Vec<String>,
}

fn mock_change_percent() -> f64 {
    let pct: f64 = rand::rng().random_range(-2.5..2.5);
    (pct * 10.0).round() / 10.0
}

impl PortfolioService {
    pub fn new(
        portfolio: Portfolio,
        store: Option<Arc<dyn PortfolioStore>>,
        cash_mode: CashUpdateMode,
    ) -> Self {
        let cash_synced = AtomicBool::new(store.is_none());
        Self {
            portfolio: Mutex::new(portfolio),
            store,
            cash_mode,
            mock_changes: false,
            cash_synced,
        }
    }

    pub fn with_mock_changes(mut self, enabled: bool) -> Self {
        self.mock_changes = enabled;
        self
    }

    pub fn is_remote(&self) -> bool {
        self.store.is_some()
    }

    pub fn snapshot(&self) -> Portfolio {
        self.portfolio.lock().clone()
    }

    pub fn view(&self) -> PortfolioView {
        self.portfolio.lock().view()
    }

    pub async fn add_holding(&self, input: CreateHolding) -> Result<Holding, AppError> {
        let added = {
            let mut portfolio = self.portfolio.lock();
            let mut added =
                portfolio.add_holding(&input.symbol, &input.name, input.shares, input.price)?;
            if self.mock_changes {
                let pct = mock_change_percent();
                portfolio.set_change_percent(&added.symbol, Some(pct));
                added.change_percent = Some(pct);
            }
            added
        };
        info!("Added {} locally ({} shares @ {})", added.symbol, added.shares, added.price);

        let Some(store) = &self.store else {
            return Ok(added);
        };

        let request = NewHoldingRequest {
            symbol: added.symbol.clone(),
            name: added.name.clone(),
            shares: added.shares,
        };
        match store.add_holding(request).await {
            Ok(created) => {
                let mut portfolio = self.portfolio.lock();
                let Some(current) = portfolio.get(&added.symbol).cloned() else {
                    // Removed again while the request was in flight.
                    return Ok(added);
                };
                portfolio.update_holding(&current.symbol, current.shares, created.purchase_price)?;
                portfolio.set_name(&current.symbol, &created.name);
                Ok(portfolio.get(&current.symbol).cloned().unwrap_or(added))
            }
            Err(e) => {
                error!("Failed to add {} remotely, reverting: {}", added.symbol, e);
                self.portfolio.lock().remove_holding(&added.symbol);
                Err(e.into())
            }
        }
    }

    /// Removing a symbol that isn't held is a no-op.
    pub async fn remove_holding(&self, symbol: &str) -> Result<(), AppError> {
        let removed = self.portfolio.lock().remove_holding(symbol);
        let Some((index, removed)) = removed else {
            info!("Remove {}: not in portfolio, nothing to do", symbol);
            return Ok(());
        };
        info!("Removed {} locally", removed.symbol);

        let Some(store) = &self.store else {
            return Ok(());
        };

        match store.remove_holding(&removed.symbol).await {
            Ok(_) => Ok(()),
            Err(StoreError::BadResponse { status: 404, .. }) => {
                warn!("{} was already gone from the remote portfolio", removed.symbol);
                Ok(())
            }
            Err(e) => {
                error!("Failed to remove {} remotely, reverting: {}", removed.symbol, e);
                self.portfolio.lock().restore_holding(index, removed);
                Err(e.into())
            }
        }
    }

    pub async fn update_holding(
        &self,
        symbol: &str,
        input: UpdateHolding,
    ) -> Result<Holding, AppError> {
        let (previous, updated) = {
            let mut portfolio = self.portfolio.lock();
            let previous = portfolio.get(symbol).cloned();
            let updated = portfolio.update_holding(symbol, input.shares, input.price)?;
            (previous, updated)
        };
        info!("Updated {} locally ({} shares @ {})", updated.symbol, updated.shares, updated.price);

        let Some(store) = &self.store else {
            return Ok(updated);
        };

        let request = UpdateHoldingRequest {
            symbol: updated.symbol.clone(),
            shares: updated.shares,
            price: updated.price,
        };
        match store.update_holding(request).await {
            Ok(_) => Ok(updated),
            Err(e) => {
                error!("Failed to update {} remotely, reverting: {}", updated.symbol, e);
                if let Some(prev) = previous {
                    // The holding may have been removed meanwhile; nothing to restore then.
                    let _ = self
                        .portfolio
                        .lock()
                        .update_holding(&prev.symbol, prev.shares, prev.price);
                }
                Err(e.into())
            }
        }
    }

    /// Sets the absolute cash balance and returns the balance after reconciliation.
    ///
    /// In delta mode the remote balance must be known before a delta can be
    /// computed. Until a refresh has succeeded it is fetched first.
    pub async fn set_cash_balance(&self, amount: f64) -> Result<f64, AppError> {
        let previous = {
            let mut portfolio = self.portfolio.lock();
            let previous = portfolio.cash_balance();
            portfolio.set_cash_balance(amount)?;
            previous
        };
        info!("Cash balance set locally: {} -> {}", previous, amount);

        let Some(store) = &self.store else {
            return Ok(amount);
        };

        match self.push_cash(store.as_ref(), amount, previous).await {
            Ok(balance) => {
                self.portfolio.lock().set_cash_balance(balance.cash_balance)?;
                self.cash_synced.store(true, Ordering::SeqCst);
                Ok(balance.cash_balance)
            }
            Err(e) => {
                error!("Failed to update cash remotely, reverting to {}: {}", previous, e);
                self.portfolio.lock().set_cash_balance(previous)?;
                Err(e.into())
            }
        }
    }

    async fn push_cash(
        &self,
        store: &dyn PortfolioStore,
        amount: f64,
        local: f64,
    ) -> Result<CashBalance, StoreError> {
        let amount = match self.cash_mode {
            CashUpdateMode::Absolute => amount,
            CashUpdateMode::Delta if self.cash_synced.load(Ordering::SeqCst) => amount - local,
            CashUpdateMode::Delta => {
                let remote = store.fetch_cash().await?.cash_balance;
                warn!("Local cash {} was never synced, using remote balance {}", local, remote);
                amount - remote
            }
        };
        store.adjust_cash(CashUpdateRequest { amount }).await
    }

    /// Removes every holding, one remote call per symbol. Stops at the first failure.
    pub async fn clear(&self) -> Result<(), AppError> {
        if self.store.is_none() {
            self.portfolio.lock().clear();
            return Ok(());
        }

        let symbols: Vec<String> = self
            .portfolio
            .lock()
            .holdings()
            .iter()
            .map(|h| h.symbol.clone())
            .collect();

        for symbol in symbols {
            self.remove_holding(&symbol).await?;
        }
        Ok(())
    }

    /// Replaces the local snapshot with the remote one. Rows that cannot be
    /// priced or fail validation are left out; duplicate symbols are merged.
    /// All of them are listed in the returned report.
    pub async fn refresh(&self) -> Result<RefreshReport, AppError> {
        let Some(store) = &self.store else {
            return Ok(RefreshReport::default());
        };

        let (rows, cash) = tokio::try_join!(store.fetch_holdings(), store.fetch_cash())?;

        let mut snapshot = Portfolio::new(cash.cash_balance)
            .map_err(|e| AppError::Remote(format!("invalid cash balance: {}", e)))?;
        let mut report = RefreshReport::default();
        for row in rows {
            let symbol = row.symbol.trim().to_uppercase();
            let Some(holding) = row.into_holding() else {
                warn!("Skipping unpriced holding {}", symbol);
                report.unpriced.push(symbol);
                continue;
            };
            match snapshot.merge_holding(holding) {
                Ok(false) => {}
                Ok(true) => {
                    warn!("Merged duplicate rows for {}", symbol);
                    if !report.merged.contains(&symbol) {
                        report.merged.push(symbol);
                    }
                }
                Err(e) => {
                    warn!("Skipping invalid holding {}: {}", symbol, e);
                    report.invalid.push(symbol);
                }
            }
        }

        info!(
            "Loaded {} holdings and cash {} from remote",
            snapshot.len(),
            snapshot.cash_balance()
        );
        *self.portfolio.lock() = snapshot;
        self.cash_synced.store(true, Ordering::SeqCst);
        Ok(report)
    }
}
