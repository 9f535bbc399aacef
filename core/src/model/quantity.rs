// cartsync/src/model/quantity.rs

use crate::error::{CartError, CartResult};

/// Parses free-form quantity input (e.g. from a prompt) into a positive count.
///
/// Surrounding whitespace is ignored; anything else that is not a whole
/// number >= 1 (`"0"`, `"-2"`, `"3abc"`, `"1.5"`, `""`) is rejected with
/// `InvalidQuantity`.
pub fn parse_quantity(input: &str) -> CartResult<i64> {
  let trimmed = input.trim();
  match trimmed.parse::<i64>() {
    Ok(quantity) if quantity >= 1 => Ok(quantity),
    _ => Err(CartError::invalid_quantity(trimmed)),
  }
}
