// cartsync/src/listener/event.rs

use serde::Deserialize;

pub const ADD_TO_CART_ACTION: &str = "add_to_cart";
pub const SUCCESS_STATUS: &str = "success";

/// Inbound notification body; unknown extra fields are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvalidationEvent {
  pub action: String,
  pub status: String,
}

impl InvalidationEvent {
  pub fn is_cart_invalidation(&self) -> bool {
    self.action == ADD_TO_CART_ACTION && self.status == SUCCESS_STATUS
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerAction {
  Refetch,
  Ignored(String),
}

pub fn classify(raw: &str) -> ListenerAction {
  match serde_json::from_str::<InvalidationEvent>(raw) {
    Ok(event) if event.is_cart_invalidation() => ListenerAction::Refetch,
    Ok(event) => ListenerAction::Ignored(format!(
      "not actionable: action='{}' status='{}'",
      event.action, event.status
    )),
    Err(e) => ListenerAction::Ignored(format!("malformed notification: {}", e)),
  }
}
