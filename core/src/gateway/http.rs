// cartsync/src/gateway/http.rs

//! `CartService` over HTTP: `GET`/`POST {base}{cart_path}/{owner}`.

use super::service::CartService;
use crate::config::SessionConfig;
use crate::error::{CartError, CartResult};
use crate::model::{decode_cart_body, decode_mutation_body, encode_mutation_body, LineItem, MutationReceipt, PayloadStyle};
use async_trait::async_trait;
use reqwest::{header, Client, Response, Url};
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct HttpCartService {
  client: Client,
  base_url: Url,
  cart_path: Vec<String>,
  payload_style: PayloadStyle,
}

impl HttpCartService {
  /// `cart_path` is the resource prefix, e.g. `/api/cart`; the owner is
  /// appended as one (percent-encoded) path segment.
  pub fn new(
    base_url: &str,
    cart_path: &str,
    payload_style: PayloadStyle,
    timeout: Option<Duration>,
  ) -> CartResult<Self> {
    let base_url = Url::parse(base_url).map_err(|e| CartError::Config(format!("Invalid service URL '{}': {}", base_url, e)))?;
    if base_url.cannot_be_a_base() {
      return Err(CartError::Config(format!("Service URL '{}' cannot be a base URL", base_url)));
    }

    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder
      .build()
      .map_err(|e| CartError::Config(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Self {
      client,
      base_url,
      cart_path: cart_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect(),
      payload_style,
    })
  }

  pub fn from_config(config: &SessionConfig) -> CartResult<Self> {
    Self::new(&config.service_url, &config.cart_path, config.payload_style, config.request_timeout)
  }

  pub fn cart_url(&self, owner: &str) -> CartResult<Url> {
    let mut url = self.base_url.clone();
    {
      let mut segments = url
        .path_segments_mut()
        .map_err(|_| CartError::Config(format!("Service URL '{}' cannot be a base URL", self.base_url)))?;
      segments.pop_if_empty();
      segments.extend(self.cart_path.iter());
      segments.push(owner);
    }
    Ok(url)
  }

  async fn success_body(response: Response) -> CartResult<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
      let reason = status.canonical_reason().unwrap_or("Unknown Status");
      warn!(status = status.as_u16(), reason, "Cart service answered with a non-success status.");
      return Err(CartError::sync_failure(
        Some(status.as_u16()),
        format!("HTTP {} {}", status.as_u16(), reason),
      ));
    }
    let bytes = response.bytes().await.map_err(transport_failure)?;
    Ok(bytes.to_vec())
  }
}

fn transport_failure(err: reqwest::Error) -> CartError {
  warn!(error = %err, "Cart service transport error.");
  CartError::sync_failure(err.status().map(|s| s.as_u16()), err.to_string())
}

#[async_trait]
impl CartService for HttpCartService {
  #[instrument(name = "HttpCartService::fetch_cart", skip(self))]
  async fn fetch_cart(&self, owner: &str) -> CartResult<Vec<LineItem>> {
    let url = self.cart_url(owner)?;
    let response = self
      .client
      .get(url)
      .header(header::ACCEPT, "application/json")
      .send()
      .await
      .map_err(transport_failure)?;
    let body = Self::success_body(response).await?;
    let items = decode_cart_body(&body)
      .map_err(|e| CartError::sync_failure(None, format!("Unreadable cart response: {}", e)))?;
    debug!(items = items.len(), "Fetched cart.");
    Ok(items)
  }

  #[instrument(name = "HttpCartService::send_mutation", skip(self, item), fields(product_id = %item.product_id(), quantity = item.quantity()))]
  async fn send_mutation(&self, owner: &str, item: &LineItem) -> CartResult<MutationReceipt> {
    let url = self.cart_url(owner)?;
    let body = encode_mutation_body(self.payload_style, owner, item)?;
    let response = self
      .client
      .post(url)
      .header(header::CONTENT_TYPE, "application/json")
      .header(header::ACCEPT, "application/json")
      .body(body)
      .send()
      .await
      .map_err(transport_failure)?;
    let body = Self::success_body(response).await?;
    Ok(decode_mutation_body(&body))
  }
}
