// apps/cart_service/src/main.rs

use anyhow::Context;
use cart_service::config::AppConfig;
use cart_service::state::AppState;
use std::net::TcpListener;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting cart service...");
  let app_config = AppConfig::from_env().context("loading configuration")?;

  let address = app_config.bind_address();
  let listener = TcpListener::bind(&address).with_context(|| format!("binding {}", address))?;
  let app_state = AppState::new(app_config);

  cart_service::serve(listener, app_state)?.await?;
  tracing::info!("Cart service stopped.");
  Ok(())
}
