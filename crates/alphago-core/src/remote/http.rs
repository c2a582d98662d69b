//! REST client for the order service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;

use super::{RemoteError, RemoteOrders, RemoteResult};
use crate::models::{Order, OrderChanges, OrderDraft, OrderId};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const ORDER_HTTP_TIMEOUT_SECS: u64 = 15;

/// JSON-over-HTTP implementation of [`RemoteOrders`].
///
/// - `POST   {base}/orders`      body: draft, answers `{"id": "..."}`
/// - `PATCH  {base}/orders/{id}` body: changes
/// - `DELETE {base}/orders/{id}` 404 counts as already deleted
/// - `GET    {base}/orders`      answers the caller's order list
#[derive(Clone)]
pub struct HttpOrderService {
    base_url: Url,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpOrderService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpOrderService")
            .field("base_url", &self.base_url.as_str())
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl HttpOrderService {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            access_token: normalize_text_option(access_token),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(ORDER_HTTP_TIMEOUT_SECS))
                .build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Fetch the authoritative order list
    pub async fn list_orders(&self) -> RemoteResult<Vec<Order>> {
        let response = self
            .request(Method::GET, self.orders_url(None)?)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        response
            .json::<Vec<Order>>()
            .await
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))
    }

    fn orders_url(&self, id: Option<&OrderId>) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                RemoteError::InvalidConfiguration("base URL cannot carry a path".to_string())
            })?;
            segments.pop_if_empty().push("orders");
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: Option<String>,
    name: Option<String>,
}

#[async_trait]
impl RemoteOrders for HttpOrderService {
    async fn create_order(&self, draft: &OrderDraft) -> RemoteResult<OrderId> {
        let response = self
            .request(Method::POST, self.orders_url(None)?)
            .json(draft)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let payload = response
            .json::<CreateOrderResponse>()
            .await
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))?;
        payload
            .id
            .or(payload.name)
            .and_then(|id| normalize_text_option(Some(id)))
            .map(OrderId::new)
            .ok_or_else(|| {
                RemoteError::InvalidPayload("create response did not include an id".to_string())
            })
    }

    async fn update_order(&self, id: &OrderId, changes: &OrderChanges) -> RemoteResult<()> {
        let response = self
            .request(Method::PATCH, self.orders_url(Some(id))?)
            .json(changes)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_order(&self, id: &OrderId) -> RemoteResult<()> {
        let response = self
            .request(Method::DELETE, self.orders_url(Some(id))?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Order {} already deleted remotely", id);
            return Ok(());
        }
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api(parse_api_error(status, &body)))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> RemoteResult<Url> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("base URL must not be empty".to_string())
    })?;
    if !is_http_url(&base_url) {
        return Err(RemoteError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ));
    }
    Url::parse(base_url.trim_end_matches('/'))
        .map_err(|error| RemoteError::InvalidConfiguration(format!("invalid base URL: {error}")))
}
