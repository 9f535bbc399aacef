// apps/cart_service/src/web/routes.rs

use actix_web::{web, HttpResponse};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::resource("/cart/{owner}")
          .route(web::get().to(crate::web::handlers::cart_handlers::get_cart_handler))
          .route(web::post().to(crate::web::handlers::cart_handlers::add_to_cart_handler)),
      ),
  );
}
