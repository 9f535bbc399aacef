// cartsync/src/gateway/sync.rs

//! The sync gateway: runs add and refetch round trips against the cart
//! service and reconciles their responses into the cart store.
//!
//! Both round trips are `Flow`s over a `RoundTrip` context:
//!
//! ```text
//! add:     validate_quantity -> apply_optimistic* -> issue_token -> send_mutation -> resolve_cart** -> reconcile
//! refetch: issue_token -> fetch_cart -> reconcile
//! ```
//!
//! `*` runs only in `FetchThenMerge`, `**` only in `AuthoritativeAdd`.
//! `reconcile` applies the server's items only while the round trip's token
//! is still current; otherwise it stops the flow and the response is dropped.

use super::service::CartService;
use super::state::{RoundTripKind, SyncState, SyncTracker};
use crate::config::SyncMode;
use crate::error::{CartError, CartResult};
use crate::flow::{Flow, FlowControl, FlowData, FlowOutcome, SkipCondition};
use crate::model::{parse_quantity, CartSnapshot, LineItem, MutationReceipt, ProductRef};
use crate::store::{Adjustment, CartStore, RequestToken};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, event, info, instrument, warn, Level};

/// Result of a round trip that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
  /// The server's cart replaced the local one.
  Applied,
  /// The response arrived after a newer request or local change and was
  /// dropped.
  Superseded,
  /// The server accepted an optimistic add; the local cart already shows it.
  Accepted,
}

/// Per-request flow context.
struct RoundTrip {
  owner: String,
  mode: SyncMode,
  store: FlowData<CartStore>,
  service: Arc<dyn CartService>,
  product: Option<ProductRef>,
  quantity_text: String,
  token: Option<RequestToken>,
  item: Option<LineItem>,
  rollback: Option<Vec<LineItem>>,
  server_items: Option<Vec<LineItem>>,
  applied: bool,
  accepted: bool,
}

impl RoundTrip {
  fn new(gateway: &SyncGateway) -> Self {
    Self {
      owner: gateway.owner.clone(),
      mode: gateway.mode,
      store: gateway.store.clone(),
      service: Arc::clone(&gateway.service),
      product: None,
      quantity_text: String::new(),
      token: None,
      item: None,
      rollback: None,
      server_items: None,
      applied: false,
      accepted: false,
    }
  }
}

pub struct SyncGateway {
  owner: String,
  mode: SyncMode,
  store: FlowData<CartStore>,
  service: Arc<dyn CartService>,
  tracker: Arc<SyncTracker>,
  add_flow: Flow<RoundTrip, CartError>,
  refetch_flow: Flow<RoundTrip, CartError>,
}

impl SyncGateway {
  pub fn new(mode: SyncMode, store: FlowData<CartStore>, service: Arc<dyn CartService>) -> Self {
    let owner = store.read().owner().to_string();
    Self {
      owner,
      mode,
      store,
      service,
      tracker: SyncTracker::new(),
      add_flow: build_add_flow(),
      refetch_flow: build_refetch_flow(),
    }
  }

  pub fn owner(&self) -> &str {
    &self.owner
  }

  pub fn mode(&self) -> SyncMode {
    self.mode
  }

  pub fn store(&self) -> &FlowData<CartStore> {
    &self.store
  }

  pub fn snapshot(&self) -> CartSnapshot {
    self.store.read().snapshot()
  }

  pub fn state(&self) -> SyncState {
    self.tracker.state()
  }

  pub fn last_error(&self) -> Option<String> {
    self.tracker.last_error()
  }

  /// Cart change notifications; see `CartStore::subscribe`.
  pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
    self.store.read().subscribe()
  }

  /// GETs the owner's cart and replaces the local one with it, unless a newer
  /// request or local change happened meanwhile. On failure the cart is left
  /// exactly as it was.
  #[instrument(name = "SyncGateway::fetch_cart", skip_all, fields(owner = %self.owner))]
  pub async fn fetch_cart(&self) -> CartResult<SyncOutcome> {
    let in_flight = self.tracker.begin(RoundTripKind::Refetch);
    let data = FlowData::new(RoundTrip::new(self));
    let result = self.refetch_flow.run(data.clone()).await.map(|outcome| outcome_of(outcome, &data));
    in_flight.finish(&result);
    log_result("refetch", &result);
    result
  }

  /// Adds `product` with a quantity typed by the user. The text must be a
  /// positive whole number; otherwise `InvalidQuantity` is returned and no
  /// request is sent.
  ///
  /// When the server's answer is superseded by a refetch (typically the one
  /// the add's own invalidation triggered) that refetch may have read the
  /// server cart before the add landed, so the add catches up with a refetch
  /// of its own. On return the cart reflects a server state that includes the
  /// add, or a newer local change.
  #[instrument(
    name = "SyncGateway::add_item",
    skip_all,
    fields(owner = %self.owner, product_id = %product.product_id, mode = ?self.mode)
  )]
  pub async fn add_item(&self, product: ProductRef, quantity_text: &str) -> CartResult<SyncOutcome> {
    let in_flight = self.tracker.begin(RoundTripKind::Mutation);
    let refetches_before = self.tracker.refetches_started();
    let data = FlowData::new(RoundTrip {
      product: Some(product),
      quantity_text: quantity_text.to_string(),
      ..RoundTrip::new(self)
    });

    let result = match self.add_flow.run(data.clone()).await {
      Ok(outcome) => Ok(outcome_of(outcome, &data)),
      Err(e) => {
        self.roll_back_optimistic(&data, &e);
        Err(e)
      }
    };
    let result = match result {
      Ok(SyncOutcome::Superseded) if self.tracker.refetches_started() > refetches_before => self.catch_up().await,
      other => other,
    };
    in_flight.finish(&result);
    log_result("add", &result);
    result
  }

  /// POSTs an already-built item; its quantity is the requested amount.
  pub async fn send_mutation(&self, item: LineItem) -> CartResult<SyncOutcome> {
    let quantity_text = item.quantity().to_string();
    self.add_item(ProductRef::from(&item), &quantity_text).await
  }

  /// Local quantity change (both modes). Counts as a local mutation, so an
  /// in-flight fetch issued before it will not overwrite it.
  pub fn adjust_quantity(&self, product_id: &str, delta: i64) -> CartResult<Adjustment> {
    self.store.write().adjust_quantity(product_id, delta)
  }

  // Runs after an add whose answer lost to a refetch. This GET and any refetch
  // with a newer token start after the POST completed, so all of them see the
  // add; losing again only means waiting for those to land.
  async fn catch_up(&self) -> CartResult<SyncOutcome> {
    debug!(owner = %self.owner, "Add superseded by a refetch; refetching to catch up.");
    let data = FlowData::new(RoundTrip::new(self));
    let outcome = self.refetch_flow.run(data.clone()).await.map(|outcome| outcome_of(outcome, &data))?;
    if outcome == SyncOutcome::Superseded {
      self.tracker.refetches_settled().await;
    }
    Ok(outcome)
  }

  // FetchThenMerge: a failed send restores the pre-call cart, unless the user
  // changed something since (then the newer local state stands).
  fn roll_back_optimistic(&self, data: &FlowData<RoundTrip>, err: &CartError) {
    if !matches!(err, CartError::SyncFailure { .. }) {
      return;
    }
    let (token, rollback) = {
      let mut round_trip = data.write();
      (round_trip.token, round_trip.rollback.take())
    };
    let (Some(token), Some(items)) = (token, rollback) else {
      return;
    };
    match self.store.write().replace_if_current(token, items) {
      Ok(true) => info!(owner = %self.owner, "Optimistic add rolled back after sync failure."),
      Ok(false) => debug!(owner = %self.owner, "Newer local changes present; optimistic add kept."),
      Err(e) => warn!(owner = %self.owner, error = %e, "Rolling back optimistic add failed."),
    }
  }
}

fn outcome_of(outcome: FlowOutcome, data: &FlowData<RoundTrip>) -> SyncOutcome {
  let round_trip = data.read();
  match outcome {
    FlowOutcome::Stopped => SyncOutcome::Superseded,
    FlowOutcome::Completed if round_trip.applied => SyncOutcome::Applied,
    FlowOutcome::Completed if round_trip.accepted => SyncOutcome::Accepted,
    // Every completing path sets one of the two flags.
    FlowOutcome::Completed => SyncOutcome::Superseded,
  }
}

fn log_result(kind: &str, result: &CartResult<SyncOutcome>) {
  match result {
    Ok(outcome) => event!(Level::INFO, kind, ?outcome, "Round trip finished."),
    Err(e) => event!(Level::WARN, kind, error = %e, "Round trip failed; cart left unchanged."),
  }
}

fn skip_when(predicate: fn(&RoundTrip) -> bool) -> Option<SkipCondition<RoundTrip>> {
  let condition: SkipCondition<RoundTrip> = Arc::new(move |data: &FlowData<RoundTrip>| predicate(&data.read()));
  Some(condition)
}

fn build_add_flow() -> Flow<RoundTrip, CartError> {
  let mut flow = Flow::new(
    "add_to_cart",
    &[
      ("validate_quantity", false, None),
      ("apply_optimistic", false, skip_when(|rt| rt.mode != SyncMode::FetchThenMerge)),
      ("issue_token", false, skip_when(|rt| rt.token.is_some())),
      ("send_mutation", false, None),
      ("resolve_cart", false, skip_when(|rt| rt.mode != SyncMode::AuthoritativeAdd)),
      ("reconcile", false, skip_when(|rt| rt.server_items.is_none())),
    ],
  );
  flow.on("validate_quantity", validate_quantity);
  flow.on("apply_optimistic", apply_optimistic);
  flow.on("issue_token", issue_token);
  flow.on("send_mutation", send_mutation);
  flow.on("resolve_cart", resolve_cart);
  flow.on("reconcile", reconcile);
  flow
}

fn build_refetch_flow() -> Flow<RoundTrip, CartError> {
  let mut flow = Flow::new(
    "refetch_cart",
    &[
      ("issue_token", false, None),
      ("fetch_cart", false, None),
      ("reconcile", false, None),
    ],
  );
  flow.on("issue_token", issue_token);
  flow.on("fetch_cart", fetch_cart);
  flow.on("reconcile", reconcile);
  flow
}

// --- Step handlers ---

async fn validate_quantity(data: FlowData<RoundTrip>) -> CartResult<FlowControl> {
  let mut round_trip = data.write();
  let quantity = parse_quantity(&round_trip.quantity_text)?;
  let product = round_trip
    .product
    .take()
    .ok_or_else(|| CartError::Internal("add flow started without a product".to_string()))?;
  round_trip.item = Some(product.into_line_item(quantity)?);
  Ok(FlowControl::Continue)
}

async fn apply_optimistic(data: FlowData<RoundTrip>) -> CartResult<FlowControl> {
  let mut round_trip = data.write();
  let item = round_trip
    .item
    .clone()
    .ok_or_else(|| CartError::Internal("apply_optimistic without an item".to_string()))?;
  let quantity = item.quantity();

  let (pre_call, token) = {
    let mut store = round_trip.store.write();
    let pre_call = store.snapshot().items;
    match store.add_or_increment(item, quantity) {
      Ok(()) => {}
      // The in-memory cart is updated even when persisting it failed.
      Err(CartError::Storage { source }) => warn!(error = %source, "Optimistic add not persisted."),
      Err(e) => return Err(e),
    }
    (pre_call, store.issue_token())
  };
  round_trip.rollback = Some(pre_call);
  round_trip.token = Some(token);
  Ok(FlowControl::Continue)
}

async fn issue_token(data: FlowData<RoundTrip>) -> CartResult<FlowControl> {
  let mut round_trip = data.write();
  let token = round_trip.store.write().issue_token();
  debug!(token = token.value(), "Request token issued.");
  round_trip.token = Some(token);
  Ok(FlowControl::Continue)
}

async fn send_mutation(data: FlowData<RoundTrip>) -> CartResult<FlowControl> {
  let (service, owner, item, mode) = {
    let round_trip = data.read();
    (
      Arc::clone(&round_trip.service),
      round_trip.owner.clone(),
      round_trip.item.clone(),
      round_trip.mode,
    )
  };
  let item = item.ok_or_else(|| CartError::Internal("send_mutation without an item".to_string()))?;

  let receipt = service.send_mutation(&owner, &item).await?;

  let mut round_trip = data.write();
  match (mode, receipt) {
    (SyncMode::FetchThenMerge, _) => round_trip.accepted = true,
    (SyncMode::AuthoritativeAdd, MutationReceipt::Cart(items)) => round_trip.server_items = Some(items),
    (SyncMode::AuthoritativeAdd, receipt) => {
      debug!(?receipt, "Mutation answered without the full cart; will refetch.");
    }
  }
  Ok(FlowControl::Continue)
}

async fn resolve_cart(data: FlowData<RoundTrip>) -> CartResult<FlowControl> {
  let needs_fetch = data.read().server_items.is_none();
  if needs_fetch {
    return fetch_cart(data).await;
  }
  Ok(FlowControl::Continue)
}

async fn fetch_cart(data: FlowData<RoundTrip>) -> CartResult<FlowControl> {
  let (service, owner) = {
    let round_trip = data.read();
    (Arc::clone(&round_trip.service), round_trip.owner.clone())
  };
  let items = service.fetch_cart(&owner).await?;
  data.write().server_items = Some(items);
  Ok(FlowControl::Continue)
}

async fn reconcile(data: FlowData<RoundTrip>) -> CartResult<FlowControl> {
  let mut round_trip = data.write();
  let token = round_trip
    .token
    .ok_or_else(|| CartError::Internal("reconcile without a request token".to_string()))?;
  let items = round_trip.server_items.take().unwrap_or_default();

  let applied = {
    let mut store = round_trip.store.write();
    match store.replace_if_current(token, items) {
      Ok(applied) => applied,
      Err(CartError::Storage { source }) => {
        warn!(error = %source, "Reconciled cart not persisted.");
        true
      }
      Err(e) => return Err(e),
    }
  };
  round_trip.applied = applied;
  if applied {
    Ok(FlowControl::Continue)
  } else {
    Ok(FlowControl::Stop)
  }
}
