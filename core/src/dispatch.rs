// cartsync/src/dispatch.rs

//! Explicit UI command dispatch. The renderer translates clicks into
//! `UiAction`s; every error becomes a notice and never escapes.

use crate::gateway::SyncGateway;
use crate::model::{CartSnapshot, ProductRef};
use crate::notice::{Notice, NoticeBoard};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
  /// "Add" clicked; `requested_quantity` is the raw text the user typed.
  Add {
    product: ProductRef,
    requested_quantity: String,
  },
  /// +/- buttons and "remove" (a delta of minus the current quantity).
  Adjust { product_id: String, delta: i64 },
  Refresh,
}

impl UiAction {
  fn label(&self) -> &'static str {
    match self {
      UiAction::Add { .. } => "add",
      UiAction::Adjust { .. } => "adjust",
      UiAction::Refresh => "refresh",
    }
  }
}

/// What the renderer needs after an action: the cart to draw and the notice
/// to show, if the action failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
  pub snapshot: CartSnapshot,
  pub notice: Option<Notice>,
}

#[derive(Clone)]
pub struct Dispatcher {
  gateway: Arc<SyncGateway>,
  notices: Arc<NoticeBoard>,
}

impl Dispatcher {
  pub fn new(gateway: Arc<SyncGateway>, notices: Arc<NoticeBoard>) -> Self {
    Self { gateway, notices }
  }

  #[instrument(name = "Dispatcher::dispatch", skip_all, fields(action = action.label()))]
  pub async fn dispatch(&self, action: UiAction) -> DispatchReport {
    let result = match action {
      UiAction::Add {
        product,
        requested_quantity,
      } => self.gateway.add_item(product, &requested_quantity).await.map(|_| ()),
      UiAction::Adjust { product_id, delta } => self.gateway.adjust_quantity(&product_id, delta).map(|_| ()),
      UiAction::Refresh => self.gateway.fetch_cart().await.map(|_| ()),
    };

    let notice = match result {
      Ok(()) => None,
      Err(e) => Some(self.notices.post_error(&e)),
    };
    let snapshot = self.gateway.snapshot();
    debug!(items = snapshot.len(), total = snapshot.total, "Action dispatched.");
    DispatchReport { snapshot, notice }
  }
}
