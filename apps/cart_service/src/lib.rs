// apps/cart_service/src/lib.rs

//! Reference cart service for the cartsync widget: an in-memory
//! server-of-record that merges added items per owner and publishes an
//! invalidation to the owner's notification channel after every add.

pub mod config;
pub mod errors;
pub mod pipelines;
pub mod repository;
pub mod state;
pub mod web;

use crate::state::AppState;
use actix_web::dev::Server;
use actix_web::{web as actix_data, App, HttpServer};
use std::net::TcpListener;

/// Serves the cart routes on an already bound listener. The returned server
/// must be awaited (or spawned) to run.
pub fn serve(listener: TcpListener, app_state: AppState) -> std::io::Result<Server> {
  let address = listener.local_addr()?;
  tracing::info!(%address, "Cart service listening.");

  let server = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .listen(listener)?
  .run();
  Ok(server)
}
