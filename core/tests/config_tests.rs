// tests/config_tests.rs
mod common;

use cartsync::{CartError, PayloadStyle, SessionConfig, SyncMode};
use common::setup_tracing;
use serial_test::serial;
use std::collections::HashMap;
use std::time::Duration;

const VARS: &[&str] = &[
  "CARTSYNC_OWNER",
  "CARTSYNC_MODE",
  "CARTSYNC_SERVICE_URL",
  "CARTSYNC_CART_PATH",
  "CARTSYNC_PAYLOAD",
  "CARTSYNC_STORAGE_DIR",
  "CARTSYNC_TIMEOUT_MS",
  "CARTSYNC_NOTICE_CAPACITY",
];

fn clear_env() {
  for var in VARS {
    std::env::remove_var(var);
  }
}

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
  let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
  move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_nothing_is_set() {
  let config = SessionConfig::from_lookup(lookup(&[])).unwrap();
  assert_eq!(config.owner, "default_user");
  assert_eq!(config.mode, SyncMode::AuthoritativeAdd);
  assert_eq!(config.service_url, "http://127.0.0.1:8080");
  assert_eq!(config.cart_path, "/api/cart");
  assert_eq!(config.payload_style, PayloadStyle::Item);
  assert_eq!(config.storage_dir, None);
  assert_eq!(config.request_timeout, None);
  assert_eq!(config.notice_capacity, 32);
}

#[test]
fn every_variable_is_read() {
  let config = SessionConfig::from_lookup(lookup(&[
    ("CARTSYNC_OWNER", "alice"),
    ("CARTSYNC_MODE", "optimistic"),
    ("CARTSYNC_SERVICE_URL", "http://shop.test:9000"),
    ("CARTSYNC_CART_PATH", "/v2/carts"),
    ("CARTSYNC_PAYLOAD", "Envelope"),
    ("CARTSYNC_STORAGE_DIR", "/tmp/cartsync"),
    ("CARTSYNC_TIMEOUT_MS", "1500"),
    ("CARTSYNC_NOTICE_CAPACITY", "4"),
  ]))
  .unwrap();

  assert_eq!(config.owner, "alice");
  assert_eq!(config.mode, SyncMode::FetchThenMerge);
  assert_eq!(config.service_url, "http://shop.test:9000");
  assert_eq!(config.cart_path, "/v2/carts");
  assert_eq!(config.payload_style, PayloadStyle::Envelope);
  assert_eq!(config.storage_dir.as_deref(), Some(std::path::Path::new("/tmp/cartsync")));
  assert_eq!(config.request_timeout, Some(Duration::from_millis(1500)));
  assert_eq!(config.notice_capacity, 4);
}

#[test]
fn blank_values_fall_back_to_defaults() {
  let config = SessionConfig::from_lookup(lookup(&[("CARTSYNC_OWNER", "   "), ("CARTSYNC_MODE", "")])).unwrap();
  assert_eq!(config.owner, "default_user");
  assert_eq!(config.mode, SyncMode::AuthoritativeAdd);
}

#[test]
fn invalid_values_are_config_errors() {
  for (key, value) in [
    ("CARTSYNC_MODE", "eventual"),
    ("CARTSYNC_PAYLOAD", "xml"),
    ("CARTSYNC_TIMEOUT_MS", "soon"),
    ("CARTSYNC_NOTICE_CAPACITY", "-1"),
  ] {
    let err = SessionConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
    assert!(matches!(err, CartError::Config(_)), "{}={} gave {:?}", key, value, err);
  }
}

#[test]
fn mode_aliases_parse() {
  for alias in ["authoritative", "authoritative-add", "A"] {
    assert_eq!(alias.parse::<SyncMode>().unwrap(), SyncMode::AuthoritativeAdd);
  }
  for alias in ["optimistic", "fetch-then-merge", "b"] {
    assert_eq!(alias.parse::<SyncMode>().unwrap(), SyncMode::FetchThenMerge);
  }
}

#[test]
#[serial]
fn from_env_reads_process_environment() {
  setup_tracing();
  clear_env();
  std::env::set_var("CARTSYNC_OWNER", "env_user");
  std::env::set_var("CARTSYNC_MODE", "b");

  let config = SessionConfig::from_env().unwrap();
  clear_env();

  assert_eq!(config.owner, "env_user");
  assert_eq!(config.mode, SyncMode::FetchThenMerge);
}

#[test]
#[serial]
fn from_env_surfaces_invalid_values() {
  setup_tracing();
  clear_env();
  std::env::set_var("CARTSYNC_TIMEOUT_MS", "12ms");

  let result = SessionConfig::from_env();
  clear_env();

  assert!(matches!(result, Err(CartError::Config(_))));
}
