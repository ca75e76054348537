mod holding;
mod portfolio;

pub use holding::{
    normalize_symbol, validate_quantities, CreateHolding, Holding, UpdateCash, UpdateHolding,
};
pub use portfolio::{Allocation, DayChange, HoldingView, Portfolio, PortfolioTotals, PortfolioView};
