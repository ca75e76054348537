use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::external::portfolio_store::{
    Acknowledgement, CashBalance, CashUpdateRequest, CreatedHolding, NewHoldingRequest,
    PortfolioStore, RemoteHolding, StoreError, UpdateHoldingRequest,
};
use crate::session::SessionContext;

/// Talks to the external portfolio service over HTTP.
pub struct HttpPortfolioStore {
    client: reqwest::Client,
    base_url: Url,
    session: SessionContext,
}

// FastAPI error bodies: { "detail": "Stock not found in portfolio" }
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpPortfolioStore {
    pub fn new(
        base_url: &str,
        session: SessionContext,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Parse(format!("invalid base url {}: {}", base_url, e)))?;
        // Url::join drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, StoreError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| StoreError::Parse(format!("invalid path {}: {}", path, e)))?;

        let mut builder = self.client.request(method, url);
        if let Some(bearer) = self.session.bearer() {
            builder = builder.header(header::AUTHORIZATION, bearer);
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let resp = Self::check_status(resp).await?;

        resp.json::<T>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn check_status(resp: Response) -> Result<Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { detail: serde_json::Value::String(s) }) => s,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            Err(_) => body,
        };

        Err(StoreError::BadResponse {
            status: status.as_u16(),
            message,
        })
    }
}

fn check_cash(balance: CashBalance) -> Result<CashBalance, StoreError> {
    if !balance.cash_balance.is_finite() || balance.cash_balance < 0.0 {
        return Err(StoreError::Parse(format!(
            "cash_balance must be >= 0, got {}",
            balance.cash_balance
        )));
    }
    Ok(balance)
}

#[async_trait]
impl PortfolioStore for HttpPortfolioStore {
    async fn fetch_holdings(&self) -> Result<Vec<RemoteHolding>, StoreError> {
        debug!("GET /portfolio");
        self.send(self.request(Method::GET, "portfolio")?).await
    }

    async fn fetch_cash(&self) -> Result<CashBalance, StoreError> {
        debug!("GET /portfolio/cash");
        let balance = self.send(self.request(Method::GET, "portfolio/cash")?).await?;
        check_cash(balance)
    }

    async fn add_holding(&self, request: NewHoldingRequest) -> Result<CreatedHolding, StoreError> {
        debug!("POST /portfolio/add {}", request.symbol);
        let created: CreatedHolding = self
            .send(self.request(Method::POST, "portfolio/add")?.json(&request))
            .await?;

        if !created.purchase_price.is_finite() || created.purchase_price <= 0.0 {
            return Err(StoreError::Parse(format!(
                "service returned non-positive price {} for {}",
                created.purchase_price, created.symbol
            )));
        }
        Ok(created)
    }

    async fn remove_holding(&self, symbol: &str) -> Result<Acknowledgement, StoreError> {
        debug!("DELETE /portfolio/remove/{}", symbol);
        let path = format!("portfolio/remove/{}", symbol);
        self.send(self.request(Method::DELETE, &path)?).await
    }

    async fn update_holding(
        &self,
        request: UpdateHoldingRequest,
    ) -> Result<Acknowledgement, StoreError> {
        debug!("PUT /portfolio/update {}", request.symbol);
        self.send(self.request(Method::PUT, "portfolio/update")?.json(&request))
            .await
    }

    async fn adjust_cash(&self, request: CashUpdateRequest) -> Result<CashBalance, StoreError> {
        debug!("POST /portfolio/cash amount={}", request.amount);
        let balance = self
            .send(self.request(Method::POST, "portfolio/cash")?.json(&request))
            .await?;
        check_cash(balance)
    }
}
