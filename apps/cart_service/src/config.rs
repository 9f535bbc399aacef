// apps/cart_service/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Per-owner buffer of the invalidation broadcast channel.
  pub notification_capacity: usize,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      notification_capacity: 64,
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let defaults = Self::default();
    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = match get_env("SERVER_PORT") {
      Some(raw) => raw
        .trim()
        .parse::<u16>()
        .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?,
      None => defaults.server_port,
    };
    let notification_capacity = match get_env("NOTIFICATION_CAPACITY") {
      Some(raw) => raw
        .trim()
        .parse::<usize>()
        .map_err(|e| AppError::Config(format!("Invalid NOTIFICATION_CAPACITY: {}", e)))?,
      None => defaults.notification_capacity,
    };

    tracing::info!(%server_host, server_port, notification_capacity, "Application configuration loaded.");
    Ok(Self {
      server_host,
      server_port,
      notification_capacity,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
