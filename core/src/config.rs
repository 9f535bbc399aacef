// cartsync/src/config.rs

use crate::error::{CartError, CartResult};
use crate::model::PayloadStyle;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How the gateway reconciles adds with the server. One mode per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
  /// Adds go to the server first; the cart shows only what the server
  /// confirmed.
  #[default]
  AuthoritativeAdd,
  /// Adds apply locally at once; server truth overwrites them on the next
  /// fetch (on load and after invalidation).
  FetchThenMerge,
}

impl FromStr for SyncMode {
  type Err = CartError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "authoritative" | "authoritative-add" | "a" => Ok(SyncMode::AuthoritativeAdd),
      "optimistic" | "fetch-then-merge" | "b" => Ok(SyncMode::FetchThenMerge),
      other => Err(CartError::Config(format!(
        "Invalid sync mode '{}': expected 'authoritative' or 'optimistic'",
        other
      ))),
    }
  }
}

impl FromStr for PayloadStyle {
  type Err = CartError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "item" => Ok(PayloadStyle::Item),
      "envelope" => Ok(PayloadStyle::Envelope),
      other => Err(CartError::Config(format!(
        "Invalid payload style '{}': expected 'item' or 'envelope'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
  /// Opaque identity supplied by the environment.
  pub owner: String,
  pub mode: SyncMode,
  pub service_url: String,
  pub cart_path: String,
  pub payload_style: PayloadStyle,
  /// Directory for file-backed session storage; in-memory when `None`.
  pub storage_dir: Option<PathBuf>,
  pub request_timeout: Option<Duration>,
  pub notice_capacity: usize,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      owner: "default_user".to_string(),
      mode: SyncMode::default(),
      service_url: "http://127.0.0.1:8080".to_string(),
      cart_path: "/api/cart".to_string(),
      payload_style: PayloadStyle::default(),
      storage_dir: None,
      request_timeout: None,
      notice_capacity: 32,
    }
  }
}

impl SessionConfig {
  /// Reads `CARTSYNC_*` variables, loading a `.env` file first if present.
  pub fn from_env() -> CartResult<Self> {
    dotenv().ok();
    let config = Self::from_lookup(|key| env::var(key).ok())?;
    tracing::info!(owner = %config.owner, mode = ?config.mode, "Session configuration loaded.");
    Ok(config)
  }

  /// Same as `from_env`, with variables resolved through `lookup`.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CartResult<Self> {
    let defaults = Self::default();
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let owner = get("CARTSYNC_OWNER").unwrap_or(defaults.owner);
    let mode = get("CARTSYNC_MODE")
      .map(|v| v.parse::<SyncMode>())
      .transpose()?
      .unwrap_or(defaults.mode);
    let service_url = get("CARTSYNC_SERVICE_URL").unwrap_or(defaults.service_url);
    let cart_path = get("CARTSYNC_CART_PATH").unwrap_or(defaults.cart_path);
    let payload_style = get("CARTSYNC_PAYLOAD")
      .map(|v| v.parse::<PayloadStyle>())
      .transpose()?
      .unwrap_or(defaults.payload_style);
    let storage_dir = get("CARTSYNC_STORAGE_DIR").map(PathBuf::from);
    let request_timeout = get("CARTSYNC_TIMEOUT_MS")
      .map(|v| {
        v.parse::<u64>()
          .map(Duration::from_millis)
          .map_err(|e| CartError::Config(format!("Invalid CARTSYNC_TIMEOUT_MS: {}", e)))
      })
      .transpose()?;
    let notice_capacity = get("CARTSYNC_NOTICE_CAPACITY")
      .map(|v| {
        v.parse::<usize>()
          .map_err(|e| CartError::Config(format!("Invalid CARTSYNC_NOTICE_CAPACITY: {}", e)))
      })
      .transpose()?
      .unwrap_or(defaults.notice_capacity);

    Ok(Self {
      owner,
      mode,
      service_url,
      cart_path,
      payload_style,
      storage_dir,
      request_timeout,
      notice_capacity,
    })
  }
}
