// cartsync/src/model/cart.rs

use super::line_item::LineItem;
use serde::{Deserialize, Serialize};

/// An owner's ordered list of line items.
///
/// The cart never stores a total; `total()` is recomputed from the items each
/// time it is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
  pub owner: String,
  pub items: Vec<LineItem>,
}

impl Cart {
  pub fn empty(owner: impl Into<String>) -> Self {
    Self {
      owner: owner.into(),
      items: Vec::new(),
    }
  }

  pub fn total(&self) -> i64 {
    total_of(&self.items)
  }

  pub fn position(&self, product_id: &str) -> Option<usize> {
    self.items.iter().position(|item| item.product_id() == product_id)
  }

  pub fn get(&self, product_id: &str) -> Option<&LineItem> {
    self.items.iter().find(|item| item.product_id() == product_id)
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn snapshot(&self) -> CartSnapshot {
    CartSnapshot {
      items: self.items.clone(),
      total: self.total(),
    }
  }
}

/// Read-only view handed to the renderer: items in display order plus total.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
  pub items: Vec<LineItem>,
  pub total: i64,
}

impl CartSnapshot {
  pub fn quantity_of(&self, product_id: &str) -> Option<i64> {
    self
      .items
      .iter()
      .find(|item| item.product_id() == product_id)
      .map(LineItem::quantity)
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

pub(crate) fn total_of(items: &[LineItem]) -> i64 {
  items
    .iter()
    .fold(0i64, |acc, item| acc.saturating_add(item.line_total()))
}
