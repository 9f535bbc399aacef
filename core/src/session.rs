// cartsync/src/session.rs

//! One `CartSession` per user session: it owns the store handle and wires the
//! gateway, dispatcher, notice board and invalidation listener around it.

use crate::config::SessionConfig;
use crate::dispatch::{DispatchReport, Dispatcher, UiAction};
use crate::error::CartResult;
use crate::flow::FlowData;
use crate::gateway::{CartService, HttpCartService, SyncGateway, SyncState};
use crate::listener::{InvalidationListener, ListenerHandle, NotificationChannel};
use crate::model::CartSnapshot;
use crate::notice::NoticeBoard;
use crate::store::storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
use crate::store::CartStore;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

pub struct CartSession {
  config: SessionConfig,
  gateway: Arc<SyncGateway>,
  dispatcher: Dispatcher,
  notices: Arc<NoticeBoard>,
  listener: Option<ListenerHandle>,
}

impl CartSession {
  /// Hydrates the cart from `storage` and builds the session around it.
  /// Nothing touches the network until `start`.
  pub fn open(config: SessionConfig, service: Arc<dyn CartService>, storage: Arc<dyn SessionStorage>) -> Self {
    let store = FlowData::new(CartStore::hydrate(config.owner.clone(), storage));
    let gateway = Arc::new(SyncGateway::new(config.mode, store, service));
    let notices = Arc::new(NoticeBoard::new(config.notice_capacity));
    let dispatcher = Dispatcher::new(Arc::clone(&gateway), Arc::clone(&notices));
    info!(owner = %config.owner, mode = ?config.mode, "Cart session opened.");

    Self {
      config,
      gateway,
      dispatcher,
      notices,
      listener: None,
    }
  }

  /// `open` with the HTTP cart service and the storage `config` asks for.
  pub fn from_config(config: SessionConfig) -> CartResult<Self> {
    let service = Arc::new(HttpCartService::from_config(&config)?);
    let storage = storage_from_config(&config)?;
    Ok(Self::open(config, service, storage))
  }

  /// Subscribes to the owner's invalidation channel, then loads the server's
  /// cart. Subscribing first means no invalidation published during the
  /// initial fetch is missed. A failed initial fetch becomes a notice; only a
  /// failed subscription is returned as an error. Calling `start` again is a
  /// no-op.
  #[instrument(name = "CartSession::start", skip_all, fields(owner = %self.config.owner))]
  pub async fn start(&mut self, channel: &dyn NotificationChannel) -> CartResult<()> {
    if self.listener.is_some() {
      debug!("Session already started.");
      return Ok(());
    }

    let subscription = channel.subscribe(&self.config.owner).await?;
    self.listener = Some(InvalidationListener::spawn(
      Arc::clone(&self.gateway),
      subscription,
      Arc::clone(&self.notices),
    ));

    if let Err(e) = self.gateway.fetch_cart().await {
      self.notices.post_error(&e);
    }
    Ok(())
  }

  pub fn config(&self) -> &SessionConfig {
    &self.config
  }

  pub fn owner(&self) -> &str {
    &self.config.owner
  }

  pub fn snapshot(&self) -> CartSnapshot {
    self.gateway.snapshot()
  }

  /// Marked changed whenever the cart changes, including refetches the
  /// invalidation listener performs in the background. Redraw on `changed()`.
  pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
    self.gateway.subscribe()
  }

  pub fn sync_state(&self) -> SyncState {
    self.gateway.state()
  }

  pub fn gateway(&self) -> &Arc<SyncGateway> {
    &self.gateway
  }

  pub fn dispatcher(&self) -> &Dispatcher {
    &self.dispatcher
  }

  pub fn notices(&self) -> &Arc<NoticeBoard> {
    &self.notices
  }

  pub async fn dispatch(&self, action: UiAction) -> DispatchReport {
    self.dispatcher.dispatch(action).await
  }

  pub fn is_listening(&self) -> bool {
    self.listener.as_ref().is_some_and(ListenerHandle::is_running)
  }

  /// Ends the session: the listener is stopped. The persisted cart stays in
  /// session storage for the next page load.
  pub async fn close(mut self) {
    if let Some(listener) = self.listener.take() {
      listener.stop().await;
    }
    info!(owner = %self.config.owner, "Cart session closed.");
  }
}

/// File-backed storage under `storage_dir` when configured, in-memory
/// otherwise.
pub fn storage_from_config(config: &SessionConfig) -> CartResult<Arc<dyn SessionStorage>> {
  match &config.storage_dir {
    Some(dir) => Ok(Arc::new(FileSessionStorage::open(dir)?)),
    None => Ok(Arc::new(MemorySessionStorage::new())),
  }
}
