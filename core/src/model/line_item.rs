// cartsync/src/model/line_item.rs

//! The cart entry value type. Every `LineItem` in memory satisfies its
//! invariants: construction and deserialization both go through `validate`.

use crate::error::{CartError, CartResult};
use serde::{Deserialize, Serialize};

/// One product entry in a cart. Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LineItemWire")]
pub struct LineItem {
  product_id: String,
  name: String,
  description: String,
  unit_price: i64,
  quantity: i64,
}

impl LineItem {
  pub fn new(
    product_id: impl Into<String>,
    name: impl Into<String>,
    description: impl Into<String>,
    unit_price: i64,
    quantity: i64,
  ) -> CartResult<Self> {
    let item = Self {
      product_id: product_id.into(),
      name: name.into(),
      description: description.into(),
      unit_price,
      quantity,
    };
    item.validate()?;
    Ok(item)
  }

  fn validate(&self) -> CartResult<()> {
    if self.product_id.trim().is_empty() {
      return Err(CartError::invalid_item("productId must not be empty"));
    }
    if self.unit_price < 0 {
      return Err(CartError::invalid_item(format!(
        "unitPrice for '{}' must be >= 0, got {}",
        self.product_id, self.unit_price
      )));
    }
    if self.quantity < 1 {
      return Err(CartError::invalid_item(format!(
        "quantity for '{}' must be >= 1, got {}",
        self.product_id, self.quantity
      )));
    }
    Ok(())
  }

  pub fn product_id(&self) -> &str {
    &self.product_id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn unit_price(&self) -> i64 {
    self.unit_price
  }

  pub fn quantity(&self) -> i64 {
    self.quantity
  }

  /// `unit_price × quantity`, saturating at `i64::MAX`.
  pub fn line_total(&self) -> i64 {
    self.unit_price.saturating_mul(self.quantity)
  }

  /// Same product, different quantity. Used for the request body of an add,
  /// where `quantity` carries the requested amount.
  pub fn with_quantity(&self, quantity: i64) -> CartResult<Self> {
    let mut item = self.clone();
    item.quantity = quantity;
    item.validate()?;
    Ok(item)
  }

  /// Store-internal: callers have already checked `quantity >= 1`.
  pub(crate) fn set_quantity(&mut self, quantity: i64) {
    debug_assert!(quantity >= 1);
    self.quantity = quantity;
  }
}

/// What an "Add" button carries: a product without a chosen quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
  pub product_id: String,
  pub name: String,
  pub description: String,
  pub unit_price: i64,
}

impl ProductRef {
  pub fn new(
    product_id: impl Into<String>,
    name: impl Into<String>,
    description: impl Into<String>,
    unit_price: i64,
  ) -> Self {
    Self {
      product_id: product_id.into(),
      name: name.into(),
      description: description.into(),
      unit_price,
    }
  }

  pub fn into_line_item(self, quantity: i64) -> CartResult<LineItem> {
    LineItem::new(self.product_id, self.name, self.description, self.unit_price, quantity)
  }
}

impl From<&LineItem> for ProductRef {
  fn from(item: &LineItem) -> Self {
    ProductRef::new(item.product_id(), item.name(), item.description(), item.unit_price())
  }
}

// Unvalidated shape used only while decoding. Accepts the storefront's older
// snake_case keys (`product_id`, `item`) alongside the camelCase wire names.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineItemWire {
  #[serde(alias = "product_id")]
  product_id: String,
  #[serde(default, alias = "item")]
  name: String,
  #[serde(default)]
  description: String,
  #[serde(alias = "unit_price")]
  unit_price: i64,
  quantity: i64,
}

impl TryFrom<LineItemWire> for LineItem {
  type Error = CartError;

  fn try_from(wire: LineItemWire) -> Result<Self, Self::Error> {
    LineItem::new(wire.product_id, wire.name, wire.description, wire.unit_price, wire.quantity)
  }
}
