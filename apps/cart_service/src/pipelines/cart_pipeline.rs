// apps/cart_service/src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtxData;
use cartsync::model::payload::MutationEnvelope;
use cartsync::{Flow, FlowControl, FlowData, LineItem};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

const INVALIDATION_PAYLOAD: &str = r#"{"action":"add_to_cart","status":"success"}"#;

/// `validate_cart_input -> merge_into_cart -> publish_invalidation`
pub fn build_add_to_cart_flow() -> Flow<AddToCartCtxData, AppError> {
  let mut p = Flow::<AddToCartCtxData, AppError>::new(
    "add_to_cart",
    &[
      ("validate_cart_input", false, None),
      ("merge_into_cart", false, None),
      ("publish_invalidation", false, None),
    ],
  );

  // Step 1: Decode the body, either a bare line item or `{owner, item}`.
  p.on("validate_cart_input", |ctx_data: FlowData<AddToCartCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let body = std::mem::take(&mut guard.body);
      let item = decode_item(&guard.owner, body)?;
      debug!(owner = %guard.owner, product_id = item.product_id(), quantity = item.quantity(), "Cart input validated.");
      guard.item = Some(item);
      Ok::<_, AppError>(FlowControl::Continue)
    })
  });

  // Step 2: Merge into the owner's cart.
  p.on("merge_into_cart", |ctx_data: FlowData<AddToCartCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let item = guard
        .item
        .take()
        .ok_or_else(|| AppError::Internal("merge_into_cart ran without a validated item".to_string()))?;
      let cart = guard.carts.merge_item(&guard.owner, item)?;
      info!(owner = %guard.owner, lines = cart.len(), "Cart updated.");
      guard.cart = Some(cart);
      Ok::<_, AppError>(FlowControl::Continue)
    })
  });

  // Step 3: Tell the owner's other sessions to refetch.
  p.on("publish_invalidation", |ctx_data: FlowData<AddToCartCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let delivered = guard.notifications.publish(&guard.owner, INVALIDATION_PAYLOAD);
      debug!(owner = %guard.owner, delivered, "Invalidation published.");
      guard.notified_subscribers = delivered;
      Ok::<_, AppError>(FlowControl::Continue)
    })
  });

  p
}

fn decode_item(path_owner: &str, body: JsonValue) -> Result<LineItem, AppError> {
  let is_envelope = body.get("item").is_some_and(JsonValue::is_object);
  if !is_envelope {
    return serde_json::from_value::<LineItem>(body).map_err(|e| AppError::Validation(format!("Invalid line item: {}", e)));
  }

  let envelope = serde_json::from_value::<MutationEnvelope>(body)
    .map_err(|e| AppError::Validation(format!("Invalid cart envelope: {}", e)))?;
  if envelope.owner != path_owner {
    warn!(path_owner, envelope_owner = %envelope.owner, "Envelope owner does not match the cart path.");
    return Err(AppError::Validation(format!(
      "Envelope owner '{}' does not match cart owner '{}'",
      envelope.owner, path_owner
    )));
  }
  Ok(envelope.item)
}
