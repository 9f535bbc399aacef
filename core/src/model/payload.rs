// cartsync/src/model/payload.rs

//! Decoding of cart service response bodies and encoding of mutation bodies.

use super::line_item::LineItem;
use crate::error::{CartError, CartResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Decodes a GET body: either `{ "cart": [...] }` or a bare `[...]`.
///
/// An empty body, `null`, or an object without a usable `cart` key counts as
/// an empty cart, matching the storefront's `data.cart || []` fallback.
pub fn decode_cart_body(body: &[u8]) -> CartResult<Vec<LineItem>> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(Vec::new());
  }
  let value: JsonValue = serde_json::from_slice(body)?;
  decode_cart_value(value)
}

fn decode_cart_value(value: JsonValue) -> CartResult<Vec<LineItem>> {
  let items = match value {
    JsonValue::Array(_) => serde_json::from_value::<Vec<LineItem>>(value)?,
    JsonValue::Object(mut map) => match map.remove("cart") {
      Some(JsonValue::Null) | None => Vec::new(),
      Some(cart) => serde_json::from_value::<Vec<LineItem>>(cart)?,
    },
    JsonValue::Null => Vec::new(),
    other => {
      return Err(CartError::from(<serde_json::Error as serde::de::Error>::custom(format!(
        "expected a cart object or array, got {}",
        other
      ))))
    }
  };
  Ok(items)
}

/// What a POST answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationReceipt {
  /// The full resulting cart.
  Cart(Vec<LineItem>),
  /// Confirmation of the single item that was added.
  Item(LineItem),
  /// A success status with a body we do not interpret.
  Acknowledged,
}

pub fn decode_mutation_body(body: &[u8]) -> MutationReceipt {
  let value: JsonValue = match serde_json::from_slice(body) {
    Ok(value) => value,
    Err(_) => return MutationReceipt::Acknowledged,
  };
  let is_cart = match &value {
    JsonValue::Array(_) => true,
    JsonValue::Object(map) => map.contains_key("cart"),
    _ => return MutationReceipt::Acknowledged,
  };
  if is_cart {
    return decode_cart_value(value).map_or(MutationReceipt::Acknowledged, MutationReceipt::Cart);
  }
  serde_json::from_value::<LineItem>(value).map_or(MutationReceipt::Acknowledged, MutationReceipt::Item)
}

/// How a mutation is wrapped on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadStyle {
  /// The line item itself is the body.
  #[default]
  Item,
  /// `{ "owner": ..., "item": ... }`, used by the push-notification variant.
  Envelope,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MutationEnvelope {
  pub owner: String,
  pub item: LineItem,
}

pub fn encode_mutation_body(style: PayloadStyle, owner: &str, item: &LineItem) -> CartResult<Vec<u8>> {
  let body = match style {
    PayloadStyle::Item => serde_json::to_vec(item)?,
    PayloadStyle::Envelope => serde_json::to_vec(&MutationEnvelope {
      owner: owner.to_string(),
      item: item.clone(),
    })?,
  };
  Ok(body)
}
