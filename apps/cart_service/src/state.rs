// apps/cart_service/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines::{cart_pipeline, contexts::AddToCartCtxData};
use crate::repository::CartRepository;
use cartsync::{BroadcastHub, Flow};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub carts: Arc<CartRepository>,
  pub notifications: Arc<BroadcastHub>,
  pub add_to_cart_flow: Arc<Flow<AddToCartCtxData, AppError>>,
}

impl AppState {
  pub fn new(config: AppConfig) -> Self {
    let notifications = Arc::new(BroadcastHub::new(config.notification_capacity));
    Self::with_hub(config, notifications)
  }

  /// Shares an existing hub, e.g. with in-process sessions.
  pub fn with_hub(config: AppConfig, notifications: Arc<BroadcastHub>) -> Self {
    Self {
      config: Arc::new(config),
      carts: Arc::new(CartRepository::new()),
      notifications,
      add_to_cart_flow: Arc::new(cart_pipeline::build_add_to_cart_flow()),
    }
  }
}
