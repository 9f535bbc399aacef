// cartsync/src/notice.rs

//! User-visible notices. Errors never end the session; they are turned into a
//! `Notice` and the renderer decides how to show them.

use crate::error::CartError;
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
  InvalidItem,
  InvalidQuantity,
  SyncFailure,
  Storage,
  Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub kind: NoticeKind,
  pub message: String,
}

impl From<&CartError> for Notice {
  fn from(err: &CartError) -> Self {
    let (kind, message) = match err {
      CartError::InvalidItem { .. } => (NoticeKind::InvalidItem, err.to_string()),
      CartError::InvalidQuantity { .. } => (
        NoticeKind::InvalidQuantity,
        "Invalid quantity. Please enter a positive number.".to_string(),
      ),
      CartError::SyncFailure { .. } => (
        NoticeKind::SyncFailure,
        format!("Could not update the cart. Please try again. ({})", err),
      ),
      CartError::Storage { .. } => (NoticeKind::Storage, err.to_string()),
      _ => (NoticeKind::Internal, err.to_string()),
    };
    Notice { kind, message }
  }
}

/// Bounded queue of notices; the oldest entry is dropped when full.
#[derive(Debug)]
pub struct NoticeBoard {
  capacity: usize,
  queue: Mutex<VecDeque<Notice>>,
}

impl NoticeBoard {
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      capacity,
      queue: Mutex::new(VecDeque::with_capacity(capacity)),
    }
  }

  pub fn post(&self, notice: Notice) {
    tracing::warn!(kind = ?notice.kind, message = %notice.message, "Notice posted.");
    let mut queue = self.queue.lock();
    if queue.len() == self.capacity {
      queue.pop_front();
    }
    queue.push_back(notice);
  }

  pub fn post_error(&self, err: &CartError) -> Notice {
    let notice = Notice::from(err);
    self.post(notice.clone());
    notice
  }

  pub fn latest(&self) -> Option<Notice> {
    self.queue.lock().back().cloned()
  }

  /// Takes every pending notice, oldest first.
  pub fn drain(&self) -> Vec<Notice> {
    self.queue.lock().drain(..).collect()
  }

  pub fn len(&self) -> usize {
    self.queue.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.queue.lock().is_empty()
  }
}

impl Default for NoticeBoard {
  fn default() -> Self {
    Self::new(32)
  }
}
