// tests/session_tests.rs
mod common;

use cartsync::session::storage_from_config;
use cartsync::{
  BroadcastHub, CartSession, MemorySessionStorage, NoticeKind, SessionConfig, SessionStorage, SyncMode, SyncState,
  UiAction,
};
use common::*;
use std::sync::Arc;
use std::time::Duration;

fn config(mode: SyncMode) -> SessionConfig {
  SessionConfig {
    owner: "alice".to_string(),
    mode,
    ..SessionConfig::default()
  }
}

fn add(product_id: &str, unit_price: i64, quantity: &str) -> UiAction {
  UiAction::Add {
    product: product(product_id, unit_price),
    requested_quantity: quantity.to_string(),
  }
}

#[tokio::test]
async fn start_subscribes_and_loads_the_server_cart() {
  setup_tracing();
  let service = MockCartService::new();
  service.seed("alice", vec![item("p1", 500, 2)]);
  let hub = BroadcastHub::default();
  let mut session = CartSession::open(config(SyncMode::AuthoritativeAdd), service.clone(), Arc::new(MemorySessionStorage::new()));

  session.start(&hub).await.unwrap();
  session.start(&hub).await.unwrap();

  assert!(session.is_listening());
  assert_eq!(hub.subscriber_count("alice"), 1);
  assert_eq!(service.fetches(), 1);
  assert_eq!(session.snapshot().total, 1000);
  assert_eq!(session.sync_state(), SyncState::Idle);
  session.close().await;
  assert_eq!(hub.subscriber_count("alice"), 0);
}

#[tokio::test]
async fn failed_initial_fetch_is_a_notice_not_an_error() {
  setup_tracing();
  let service = MockCartService::new();
  service.fail_with(Some(500));
  let hub = BroadcastHub::default();
  let mut session = CartSession::open(config(SyncMode::AuthoritativeAdd), service, Arc::new(MemorySessionStorage::new()));

  session.start(&hub).await.unwrap();

  assert_eq!(session.notices().latest().unwrap().kind, NoticeKind::SyncFailure);
  assert!(session.is_listening());
}

#[tokio::test]
async fn session_hydrates_from_storage_before_any_fetch() {
  setup_tracing();
  let storage = Arc::new(MemorySessionStorage::new());
  let service = MockCartService::new();
  {
    let first = CartSession::open(config(SyncMode::FetchThenMerge), service.clone(), storage.clone());
    first.dispatch(add("p1", 300, "2")).await;
    first.close().await;
  }

  let reopened = CartSession::open(config(SyncMode::FetchThenMerge), service, storage);
  assert_eq!(reopened.snapshot().quantity_of("p1"), Some(2));
}

#[tokio::test]
async fn dispatch_turns_errors_into_notices() {
  setup_tracing();
  let service = MockCartService::new();
  let session = CartSession::open(config(SyncMode::AuthoritativeAdd), service.clone(), Arc::new(MemorySessionStorage::new()));

  let report = session.dispatch(add("p1", 500, "lots")).await;
  let notice = report.notice.unwrap();
  assert_eq!(notice.kind, NoticeKind::InvalidQuantity);
  assert_eq!(notice.message, "Invalid quantity. Please enter a positive number.");
  assert!(report.snapshot.is_empty());

  service.fail_with(Some(500));
  let report = session.dispatch(add("p1", 500, "1")).await;
  assert_eq!(report.notice.unwrap().kind, NoticeKind::SyncFailure);
  assert!(report.snapshot.is_empty());

  assert_eq!(session.notices().drain().len(), 2);
  assert!(session.notices().is_empty());
}

#[tokio::test]
async fn dispatch_add_adjust_and_refresh() {
  setup_tracing();
  let service = MockCartService::new();
  let session = CartSession::open(config(SyncMode::AuthoritativeAdd), service.clone(), Arc::new(MemorySessionStorage::new()));

  let report = session.dispatch(add("p1", 500, "2")).await;
  assert!(report.notice.is_none());
  assert_eq!(report.snapshot.total, 1000);

  let report = session
    .dispatch(UiAction::Adjust {
      product_id: "p1".to_string(),
      delta: 1,
    })
    .await;
  assert_eq!(report.snapshot.quantity_of("p1"), Some(3));

  // Quantity changes are local; a refresh restores the server's view.
  let report = session.dispatch(UiAction::Refresh).await;
  assert_eq!(report.snapshot.quantity_of("p1"), Some(2));
  assert_eq!(service.mutations(), 1);
}

#[tokio::test]
async fn invalidation_from_another_tab_reaches_the_session() {
  setup_tracing();
  let service = MockCartService::new();
  let hub = BroadcastHub::default();
  let mut session = CartSession::open(config(SyncMode::FetchThenMerge), service.clone(), Arc::new(MemorySessionStorage::new()));
  session.start(&hub).await.unwrap();
  let mut changes = session.subscribe();

  // Another client adds to the same owner's cart and the server announces it.
  service.seed("alice", vec![item("p7", 70, 1)]);
  hub.publish("alice", r#"{"action":"add_to_cart","status":"success"}"#);

  let redrawn = tokio::time::timeout(Duration::from_secs(2), changes.wait_for(|cart| cart.quantity_of("p7").is_some()))
    .await
    .expect("renderer was never told to redraw")
    .unwrap()
    .clone();
  assert_eq!(redrawn, session.snapshot());
  session.close().await;
}

#[test]
fn notice_board_is_bounded() {
  let session = CartSession::open(
    SessionConfig {
      notice_capacity: 2,
      ..config(SyncMode::AuthoritativeAdd)
    },
    MockCartService::new(),
    Arc::new(MemorySessionStorage::new()),
  );
  let notices = session.notices();
  for input in ["a", "b", "c"] {
    notices.post_error(&cartsync::CartError::invalid_quantity(input));
  }
  assert_eq!(notices.len(), 2);
}

#[test]
fn storage_from_config_picks_file_storage_when_a_dir_is_set() {
  let dir = std::env::temp_dir().join(format!("cartsync-session-test-{}", std::process::id()));
  let storage = storage_from_config(&SessionConfig {
    storage_dir: Some(dir.clone()),
    ..SessionConfig::default()
  })
  .unwrap();
  storage.set("cart", "{}").unwrap();
  assert!(dir.join("cart.json").exists());
  std::fs::remove_dir_all(&dir).ok();

  let memory = storage_from_config(&SessionConfig::default()).unwrap();
  assert_eq!(memory.get("cart").unwrap(), None);
}
