// apps/cart_service/src/repository.rs

//! In-memory carts keyed by owner.

use cartsync::{CartError, CartResult, LineItem};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct CartRepository {
  carts: RwLock<HashMap<String, Vec<LineItem>>>,
}

impl CartRepository {
  pub fn new() -> Self {
    Self::default()
  }

  /// The owner's cart; an unknown owner has an empty one.
  pub fn cart_of(&self, owner: &str) -> Vec<LineItem> {
    self.carts.read().get(owner).cloned().unwrap_or_default()
  }

  /// Adds `item` to the owner's cart: an existing product gets
  /// `quantity += item.quantity()`, a new one is appended. Returns the
  /// resulting cart.
  pub fn merge_item(&self, owner: &str, item: LineItem) -> CartResult<Vec<LineItem>> {
    let mut carts = self.carts.write();
    let cart = carts.entry(owner.to_string()).or_default();
    match cart.iter().position(|existing| existing.product_id() == item.product_id()) {
      Some(idx) => {
        let merged = cart[idx]
          .quantity()
          .checked_add(item.quantity())
          .ok_or_else(|| CartError::invalid_quantity(item.quantity()))?;
        cart[idx] = cart[idx].with_quantity(merged)?;
        debug!(owner, product_id = item.product_id(), quantity = merged, "Cart line merged.");
      }
      None => {
        debug!(owner, product_id = item.product_id(), quantity = item.quantity(), "Cart line appended.");
        cart.push(item);
      }
    }
    Ok(cart.clone())
  }

  pub fn owner_count(&self) -> usize {
    self.carts.read().len()
  }
}
