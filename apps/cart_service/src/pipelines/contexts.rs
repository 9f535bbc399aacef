// apps/cart_service/src/pipelines/contexts.rs

use crate::repository::CartRepository;
use cartsync::{BroadcastHub, LineItem};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Context for one `POST /api/cart/{owner}`.
pub struct AddToCartCtxData {
  pub carts: Arc<CartRepository>,
  pub notifications: Arc<BroadcastHub>,
  /// Owner from the request path.
  pub owner: String,
  pub body: JsonValue,
  /// Populated by `validate_cart_input`.
  pub item: Option<LineItem>,
  /// Populated by `merge_into_cart`.
  pub cart: Option<Vec<LineItem>>,
  pub notified_subscribers: usize,
}

impl AddToCartCtxData {
  pub fn new(carts: Arc<CartRepository>, notifications: Arc<BroadcastHub>, owner: String, body: JsonValue) -> Self {
    Self {
      carts,
      notifications,
      owner,
      body,
      item: None,
      cart: None,
      notified_subscribers: 0,
    }
  }
}
