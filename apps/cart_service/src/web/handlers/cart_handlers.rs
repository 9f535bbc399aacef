// apps/cart_service/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use cartsync::{FlowData, FlowOutcome};
use serde_json::{json, Value as JsonValue};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;

#[instrument(name = "handler::get_cart", skip_all, fields(owner = %owner))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, owner: web::Path<String>) -> Result<HttpResponse, AppError> {
  let cart = app_state.carts.cart_of(&owner);
  info!(lines = cart.len(), "Cart served.");
  Ok(HttpResponse::Ok().json(json!({ "cart": cart })))
}

#[instrument(name = "handler::add_to_cart", skip_all, fields(owner = %owner))]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  owner: web::Path<String>,
  body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
  let ctx = FlowData::new(AddToCartCtxData::new(
    app_state.carts.clone(),
    app_state.notifications.clone(),
    owner.into_inner(),
    body.into_inner(),
  ));

  match app_state.add_to_cart_flow.run(ctx.clone()).await? {
    FlowOutcome::Completed => {
      let guard = ctx.read();
      let cart = guard
        .cart
        .as_ref()
        .ok_or_else(|| AppError::Internal("Cart update completed, but the cart is unavailable.".to_string()))?;
      info!(lines = cart.len(), notified = guard.notified_subscribers, "Add to cart succeeded.");
      Ok(HttpResponse::Ok().json(json!({ "cart": cart })))
    }
    FlowOutcome::Stopped => {
      warn!("Add to cart flow was stopped by a handler.");
      Err(AppError::Internal("Process to add item to cart was halted.".to_string()))
    }
  }
}
