// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset.

use cart_service::config::AppConfig;
use cart_service::state::AppState;
use cartsync::BroadcastHub;
use once_cell::sync::Lazy;
use std::net::TcpListener;
use std::sync::Arc;
use tracing::Level;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn test_state() -> AppState {
  AppState::new(AppConfig::default())
}

/// A running server on an ephemeral port.
pub struct TestApp {
  pub base_url: String,
  pub state: AppState,
  pub hub: Arc<BroadcastHub>,
}

pub fn spawn_app() -> TestApp {
  setup_tracing();
  let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
  let port = listener.local_addr().unwrap().port();

  let hub = Arc::new(BroadcastHub::new(64));
  let state = AppState::with_hub(AppConfig::default(), Arc::clone(&hub));
  let server = cart_service::serve(listener, state.clone()).expect("start server");
  tokio::spawn(server);

  TestApp {
    base_url: format!("http://127.0.0.1:{}", port),
    state,
    hub,
  }
}

pub fn line_json(product_id: &str, unit_price: i64, quantity: i64) -> serde_json::Value {
  serde_json::json!({
    "productId": product_id,
    "name": format!("Product {}", product_id),
    "description": "",
    "unitPrice": unit_price,
    "quantity": quantity,
  })
}
