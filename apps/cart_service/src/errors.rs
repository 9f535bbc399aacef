// apps/cart_service/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use cartsync::CartError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  /// Errors raised by the cart model or the add-to-cart flow itself.
  #[error("Cart Error: {source}")]
  Cart {
    #[from]
    source: CartError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    match self {
      AppError::Validation(m) => {
        tracing::warn!(error = %m, "Rejecting request.");
        HttpResponse::BadRequest().json(json!({"error": m}))
      }
      AppError::Cart { source } if source.is_user_facing() => {
        tracing::warn!(error = %source, "Rejecting cart mutation.");
        HttpResponse::BadRequest().json(json!({"error": source.to_string()}))
      }
      AppError::Cart { source } => {
        tracing::error!(error = %source, "Cart processing failed.");
        HttpResponse::InternalServerError().json(json!({"error": "Cart processing error", "detail": source.to_string()}))
      }
      AppError::Config(m) => {
        tracing::error!(error = %m, "Configuration issue.");
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Internal(m) => {
        tracing::error!(error = %m, "Internal error.");
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
