pub mod app;
pub mod config;
pub mod errors;
pub mod external;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::external::http_store::HttpPortfolioStore;
use crate::external::portfolio_store::PortfolioStore;
use crate::models::Portfolio;
use crate::services::portfolio_service::{PortfolioService, RefreshReport};
use crate::session::SessionContext;
use crate::state::AppState;

/// Loads the session, wires the remote store (if configured) and pulls the
/// initial snapshot. A failed initial load falls back to the configured
/// default cash with no holdings; that cash is not treated as the remote
/// balance until a later refresh or cash edit syncs it.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let session = SessionContext::load(&config.session_path)?;

    let store: Option<Arc<dyn PortfolioStore>> = match &config.api_url {
        Some(url) => {
            info!("🔗 Reconciling with portfolio service at {}", url);
            Some(Arc::new(HttpPortfolioStore::new(
                url,
                session.clone(),
                config.http_timeout,
            )?))
        }
        None => {
            info!("💾 No BULLSEYE_API_URL set, running local-only");
            None
        }
    };

    let portfolio = Portfolio::new(config.default_cash)?;
    let service = PortfolioService::new(portfolio, store, config.cash_mode)
        .with_mock_changes(config.mock_changes);

    if service.is_remote() {
        match service.refresh().await {
            Ok(report) if report != RefreshReport::default() => {
                warn!("Initial load adjusted remote rows: {:?}", report)
            }
            Ok(_) => {}
            Err(e) => warn!("Initial portfolio load failed, starting empty: {}", e),
        }
    }

    Ok(AppState {
        portfolio: Arc::new(service),
        session,
    })
}
