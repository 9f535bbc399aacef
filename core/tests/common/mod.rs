// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset.

use async_trait::async_trait;
use cartsync::{CartError, CartResult, CartService, LineItem, MutationReceipt, ProductRef};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Notify};
use tracing::Level;

// --- Tracing ---
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

// --- Fixtures ---
pub fn item(product_id: &str, unit_price: i64, quantity: i64) -> LineItem {
  LineItem::new(product_id, format!("Product {}", product_id), "", unit_price, quantity).unwrap()
}

pub fn product(product_id: &str, unit_price: i64) -> ProductRef {
  ProductRef::new(product_id, format!("Product {}", product_id), "", unit_price)
}

pub fn ids_and_quantities(items: &[LineItem]) -> Vec<(String, i64)> {
  items.iter().map(|i| (i.product_id().to_string(), i.quantity())).collect()
}

// --- Mock cart service ---

/// How the mock answers a POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStyle {
  FullCart,
  ItemOnly,
  Acknowledged,
}

/// In-memory server-of-record with the reference server's merge semantics.
pub struct MockCartService {
  carts: Mutex<HashMap<String, Vec<LineItem>>>,
  failure: Mutex<Option<u16>>,
  receipt_style: Mutex<ReceiptStyle>,
  fetch_gate: Mutex<Option<oneshot::Receiver<()>>>,
  pub fetch_entered: Notify,
  mutation_gate: Mutex<Option<oneshot::Receiver<()>>>,
  pub mutation_entered: Notify,
  pub fetch_calls: AtomicUsize,
  pub mutation_calls: AtomicUsize,
  pub sent: Mutex<Vec<LineItem>>,
}

impl MockCartService {
  pub fn new() -> Arc<Self> {
    Arc::new(Self {
      carts: Mutex::new(HashMap::new()),
      failure: Mutex::new(None),
      receipt_style: Mutex::new(ReceiptStyle::FullCart),
      fetch_gate: Mutex::new(None),
      fetch_entered: Notify::new(),
      mutation_gate: Mutex::new(None),
      mutation_entered: Notify::new(),
      fetch_calls: AtomicUsize::new(0),
      mutation_calls: AtomicUsize::new(0),
      sent: Mutex::new(Vec::new()),
    })
  }

  pub fn seed(&self, owner: &str, items: Vec<LineItem>) {
    self.carts.lock().insert(owner.to_string(), items);
  }

  pub fn cart_of(&self, owner: &str) -> Vec<LineItem> {
    self.carts.lock().get(owner).cloned().unwrap_or_default()
  }

  /// Every following call fails with this HTTP status (`None` heals).
  pub fn fail_with(&self, status: Option<u16>) {
    *self.failure.lock() = status;
  }

  pub fn answer_with(&self, style: ReceiptStyle) {
    *self.receipt_style.lock() = style;
  }

  /// The next fetch reads the server cart, signals `fetch_entered`, then
  /// waits for the returned sender before answering.
  pub fn hold_next_fetch(&self) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    *self.fetch_gate.lock() = Some(rx);
    tx
  }

  /// The next POST signals `mutation_entered`, then waits for the returned
  /// sender before it merges into the server cart and answers.
  pub fn hold_next_mutation(&self) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    *self.mutation_gate.lock() = Some(rx);
    tx
  }

  pub fn fetches(&self) -> usize {
    self.fetch_calls.load(Ordering::SeqCst)
  }

  pub fn mutations(&self) -> usize {
    self.mutation_calls.load(Ordering::SeqCst)
  }

  fn check_failure(&self) -> CartResult<()> {
    match *self.failure.lock() {
      Some(status) => Err(CartError::sync_failure(Some(status), format!("HTTP {}", status))),
      None => Ok(()),
    }
  }
}

#[async_trait]
impl CartService for MockCartService {
  async fn fetch_cart(&self, owner: &str) -> CartResult<Vec<LineItem>> {
    self.fetch_calls.fetch_add(1, Ordering::SeqCst);
    self.check_failure()?;
    let answer = self.cart_of(owner);
    let gate = self.fetch_gate.lock().take();
    if let Some(gate) = gate {
      self.fetch_entered.notify_one();
      gate.await.ok();
    }
    Ok(answer)
  }

  async fn send_mutation(&self, owner: &str, item: &LineItem) -> CartResult<MutationReceipt> {
    self.mutation_calls.fetch_add(1, Ordering::SeqCst);
    self.sent.lock().push(item.clone());
    let gate = self.mutation_gate.lock().take();
    if let Some(gate) = gate {
      self.mutation_entered.notify_one();
      gate.await.ok();
    }
    self.check_failure()?;

    let cart = {
      let mut carts = self.carts.lock();
      let cart = carts.entry(owner.to_string()).or_default();
      match cart.iter().position(|i| i.product_id() == item.product_id()) {
        Some(idx) => {
          let merged = cart[idx].quantity() + item.quantity();
          cart[idx] = cart[idx].with_quantity(merged)?;
        }
        None => cart.push(item.clone()),
      }
      cart.clone()
    };

    let style = *self.receipt_style.lock();
    Ok(match style {
      ReceiptStyle::FullCart => MutationReceipt::Cart(cart),
      ReceiptStyle::ItemOnly => MutationReceipt::Item(item.clone()),
      ReceiptStyle::Acknowledged => MutationReceipt::Acknowledged,
    })
  }
}
