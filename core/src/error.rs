// cartsync/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartError {
  #[error("Invalid line item: {reason}")]
  InvalidItem { reason: String },

  #[error("Invalid quantity '{input}': must be a positive whole number")]
  InvalidQuantity { input: String },

  /// Non-success response or transport error from the cart service.
  /// `status` is `None` when no HTTP response was received at all.
  #[error("Cart service sync failed: {message}")]
  SyncFailure { status: Option<u16>, message: String },

  #[error("Session storage error. Source: {source}")]
  Storage {
    #[source]
    source: AnyhowError,
  },

  #[error("Serialization error: {0}")]
  Codec(#[from] serde_json::Error),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Required flow step has no handlers: {step_name}")]
  StepMissing { step_name: String },

  #[error("Internal cartsync error: {0}")]
  Internal(String),
}

impl CartError {
  pub fn invalid_item(reason: impl Into<String>) -> Self {
    CartError::InvalidItem { reason: reason.into() }
  }

  pub fn invalid_quantity(input: impl ToString) -> Self {
    CartError::InvalidQuantity {
      input: input.to_string(),
    }
  }

  pub fn sync_failure(status: Option<u16>, message: impl Into<String>) -> Self {
    CartError::SyncFailure {
      status,
      message: message.into(),
    }
  }

  /// True for the error kinds a user can act on (bad input, server trouble),
  /// as opposed to local faults of the widget itself.
  pub fn is_user_facing(&self) -> bool {
    matches!(
      self,
      CartError::InvalidItem { .. } | CartError::InvalidQuantity { .. } | CartError::SyncFailure { .. }
    )
  }
}

impl From<AnyhowError> for CartError {
  fn from(err: AnyhowError) -> Self {
    // I/O failures come from session storage; everything else is ours.
    if err.downcast_ref::<std::io::Error>().is_some() {
      return CartError::Storage { source: err };
    }
    CartError::Internal(format!("{:#}", err))
  }
}

pub type CartResult<T, E = CartError> = std::result::Result<T, E>;
