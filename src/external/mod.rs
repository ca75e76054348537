pub mod http_store;
pub mod portfolio_store;
