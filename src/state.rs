use std::sync::Arc;

use crate::services::portfolio_service::PortfolioService;
use crate::session::SessionContext;

#[derive(Clone)]
pub struct AppState {
    pub portfolio: Arc<PortfolioService>,
    pub session: SessionContext,
}
