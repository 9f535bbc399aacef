// cartsync/src/listener/mod.rs

//! Invalidation listener: one background task per session that turns
//! `{action: "add_to_cart", status: "success"}` notifications into refetches.

pub mod channel;
pub mod event;

pub use channel::{BroadcastHub, Inbound, NotificationChannel, Subscription};
pub use event::{classify, InvalidationEvent, ListenerAction};

use crate::gateway::SyncGateway;
use crate::notice::NoticeBoard;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

pub struct InvalidationListener;

impl InvalidationListener {
  /// Spawns the listener task on the current tokio runtime. It runs until
  /// the channel closes or the returned handle is stopped or dropped.
  pub fn spawn(gateway: Arc<SyncGateway>, mut subscription: Subscription, notices: Arc<NoticeBoard>) -> ListenerHandle {
    // Root span: the task outlives whatever span spawned it.
    let span = tracing::info_span!(parent: None, "invalidation_listener", owner = %subscription.owner());
    let task = tokio::spawn(
      async move {
        info!("Invalidation listener started.");
        while let Some(inbound) = subscription.next_message().await {
          let should_refetch = match inbound {
            Inbound::Message(raw) => match classify(&raw) {
              ListenerAction::Refetch => true,
              ListenerAction::Ignored(reason) => {
                debug!(%reason, "Notification ignored.");
                false
              }
            },
            // Any of the missed messages may have been an invalidation.
            Inbound::Lagged(missed) => {
              warn!(missed, "Listener lagged behind; refetching once.");
              true
            }
          };

          if should_refetch {
            if let Err(e) = gateway.fetch_cart().await {
              notices.post_error(&e);
            }
          }
        }
        info!("Notification channel closed; invalidation listener stopped.");
      }
      .instrument(span),
    );
    ListenerHandle { task: Some(task) }
  }
}

/// Owns the listener task; dropping the handle stops the listener.
#[derive(Debug)]
pub struct ListenerHandle {
  task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
  pub fn is_running(&self) -> bool {
    self.task.as_ref().is_some_and(|task| !task.is_finished())
  }

  /// Stops the listener and waits for the task to wind down.
  pub async fn stop(mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
      // A cancelled task reports `JoinError::Cancelled`; nothing to surface.
      let _ = task.await;
    }
  }
}

impl Drop for ListenerHandle {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}
