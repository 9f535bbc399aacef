// cartsync/examples/local_session.rs

//! Runs a cart session against an in-process cart service and notification
//! hub, in both reconciliation modes.

use async_trait::async_trait;
use cartsync::{
  BroadcastHub, CartResult, CartService, CartSession, LineItem, MemorySessionStorage, MutationReceipt, ProductRef,
  SessionConfig, SyncMode, UiAction,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Server-of-record kept in memory; publishes an invalidation after each add.
struct InProcessService {
  carts: Mutex<HashMap<String, Vec<LineItem>>>,
  hub: Arc<BroadcastHub>,
}

#[async_trait]
impl CartService for InProcessService {
  async fn fetch_cart(&self, owner: &str) -> CartResult<Vec<LineItem>> {
    Ok(self.carts.lock().get(owner).cloned().unwrap_or_default())
  }

  async fn send_mutation(&self, owner: &str, item: &LineItem) -> CartResult<MutationReceipt> {
    let cart = {
      let mut carts = self.carts.lock();
      let cart = carts.entry(owner.to_string()).or_default();
      match cart.iter().position(|i| i.product_id() == item.product_id()) {
        Some(idx) => cart[idx] = cart[idx].with_quantity(cart[idx].quantity() + item.quantity())?,
        None => cart.push(item.clone()),
      }
      cart.clone()
    };
    self.hub.publish(owner, r#"{"action":"add_to_cart","status":"success"}"#);
    Ok(MutationReceipt::Cart(cart))
  }
}

async fn run(mode: SyncMode, service: Arc<InProcessService>, hub: &BroadcastHub) -> CartResult<()> {
  info!("--- {:?} ---", mode);
  let config = SessionConfig {
    owner: "demo_user".to_string(),
    mode,
    ..SessionConfig::default()
  };
  let mut session = CartSession::open(config, service, Arc::new(MemorySessionStorage::new()));
  session.start(hub).await?;

  let mug = ProductRef::new("mug-01", "Mug", "Stoneware, 350ml", 1250);
  for action in [
    UiAction::Add {
      product: mug.clone(),
      requested_quantity: "2".to_string(),
    },
    UiAction::Add {
      product: mug,
      requested_quantity: "zero".to_string(),
    },
    UiAction::Adjust {
      product_id: "mug-01".to_string(),
      delta: 1,
    },
    UiAction::Refresh,
  ] {
    let report = session.dispatch(action).await;
    for line in &report.snapshot.items {
      info!(product = line.product_id(), quantity = line.quantity(), "  line");
    }
    info!(total = report.snapshot.total, notice = ?report.notice.map(|n| n.message), "Rendered.");
  }

  session.close().await;
  Ok(())
}

#[tokio::main]
async fn main() -> CartResult<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let hub = Arc::new(BroadcastHub::default());
  for mode in [SyncMode::AuthoritativeAdd, SyncMode::FetchThenMerge] {
    let service = Arc::new(InProcessService {
      carts: Mutex::new(HashMap::new()),
      hub: Arc::clone(&hub),
    });
    run(mode, service, &hub).await?;
  }
  Ok(())
}
