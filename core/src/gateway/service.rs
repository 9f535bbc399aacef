// cartsync/src/gateway/service.rs

use crate::error::CartResult;
use crate::model::{LineItem, MutationReceipt};
use async_trait::async_trait;

/// The server-of-record for carts.
///
/// Implementations map any non-success response or transport error to
/// `CartError::SyncFailure`.
#[async_trait]
pub trait CartService: Send + Sync {
  /// GET the owner's cart.
  async fn fetch_cart(&self, owner: &str) -> CartResult<Vec<LineItem>>;

  /// POST one item; `item.quantity()` is the requested quantity.
  async fn send_mutation(&self, owner: &str, item: &LineItem) -> CartResult<MutationReceipt>;
}
