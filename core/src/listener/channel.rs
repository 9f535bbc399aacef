// cartsync/src/listener/channel.rs

use crate::error::CartResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

/// A notification channel keyed by owner.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
  async fn subscribe(&self, owner: &str) -> CartResult<Subscription>;
}

/// What a subscription yields next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
  Message(String),
  /// The subscriber fell behind and `u64` messages were dropped.
  Lagged(u64),
}

/// An open subscription to one owner's channel. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
  owner: String,
  receiver: broadcast::Receiver<String>,
}

impl Subscription {
  pub fn new(owner: impl Into<String>, receiver: broadcast::Receiver<String>) -> Self {
    Self {
      owner: owner.into(),
      receiver,
    }
  }

  pub fn owner(&self) -> &str {
    &self.owner
  }

  /// `None` once the channel is closed.
  pub async fn next_message(&mut self) -> Option<Inbound> {
    match self.receiver.recv().await {
      Ok(message) => Some(Inbound::Message(message)),
      Err(RecvError::Lagged(missed)) => Some(Inbound::Lagged(missed)),
      Err(RecvError::Closed) => None,
    }
  }
}

/// In-process channel: one broadcast sender per owner, created on first use.
#[derive(Debug)]
pub struct BroadcastHub {
  capacity: usize,
  senders: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl BroadcastHub {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity: capacity.max(1),
      senders: Mutex::new(HashMap::new()),
    }
  }

  fn sender(&self, owner: &str) -> broadcast::Sender<String> {
    self
      .senders
      .lock()
      .entry(owner.to_string())
      .or_insert_with(|| broadcast::channel(self.capacity).0)
      .clone()
  }

  /// Publishes `payload` to `owner`'s subscribers and returns how many
  /// received it. Publishing with no subscribers is not an error.
  pub fn publish(&self, owner: &str, payload: impl Into<String>) -> usize {
    let delivered = self.sender(owner).send(payload.into()).unwrap_or(0);
    debug!(owner, delivered, "Notification published.");
    delivered
  }

  pub fn subscriber_count(&self, owner: &str) -> usize {
    self
      .senders
      .lock()
      .get(owner)
      .map(broadcast::Sender::receiver_count)
      .unwrap_or(0)
  }
}

impl Default for BroadcastHub {
  fn default() -> Self {
    Self::new(64)
  }
}

#[async_trait]
impl NotificationChannel for BroadcastHub {
  async fn subscribe(&self, owner: &str) -> CartResult<Subscription> {
    let receiver = self.sender(owner).subscribe();
    debug!(owner, "Subscribed to notifications.");
    Ok(Subscription::new(owner, receiver))
  }
}
