// cartsync/src/gateway/state.rs

//! Per-session sync state: Idle, Pending (an add is in flight) or Refetching.

use crate::error::CartError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
  Idle,
  Pending,
  Refetching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTripKind {
  Mutation,
  Refetch,
}

#[derive(Debug, Default)]
struct TrackerInner {
  pending: usize,
  refetches_started: u64,
  last_error: Option<String>,
}

/// Counts in-flight round trips so overlapping requests resolve to a single
/// state: Pending while any add is in flight, else Refetching while any fetch
/// is, else Idle.
#[derive(Debug)]
pub struct SyncTracker {
  inner: Mutex<TrackerInner>,
  // In-flight refetches; a watch so callers can wait for them to drain.
  refetching: watch::Sender<usize>,
}

impl Default for SyncTracker {
  fn default() -> Self {
    Self {
      inner: Mutex::new(TrackerInner::default()),
      refetching: watch::channel(0).0,
    }
  }
}

impl SyncTracker {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn begin(self: &Arc<Self>, kind: RoundTripKind) -> InFlight {
    match kind {
      RoundTripKind::Mutation => self.inner.lock().pending += 1,
      RoundTripKind::Refetch => {
        self.inner.lock().refetches_started += 1;
        self.refetching.send_modify(|n| *n += 1);
      }
    }
    InFlight {
      tracker: Arc::clone(self),
      kind,
    }
  }

  pub fn state(&self) -> SyncState {
    if self.inner.lock().pending > 0 {
      SyncState::Pending
    } else if *self.refetching.borrow() > 0 {
      SyncState::Refetching
    } else {
      SyncState::Idle
    }
  }

  /// Total refetches begun so far; compare two readings to learn whether one
  /// started in between.
  pub fn refetches_started(&self) -> u64 {
    self.inner.lock().refetches_started
  }

  /// Resolves once no refetch is in flight.
  pub async fn refetches_settled(&self) {
    let mut in_flight = self.refetching.subscribe();
    // The sender lives as long as `self`, so this cannot fail.
    let _ = in_flight.wait_for(|n| *n == 0).await;
  }

  /// The error of the most recent failed round trip, cleared by the next
  /// successful one.
  pub fn last_error(&self) -> Option<String> {
    self.inner.lock().last_error.clone()
  }
}

/// Guard for one round trip; dropping it leaves the in-flight count.
#[derive(Debug)]
pub struct InFlight {
  tracker: Arc<SyncTracker>,
  kind: RoundTripKind,
}

impl InFlight {
  pub fn finish<T>(self, result: &Result<T, CartError>) {
    let mut inner = self.tracker.inner.lock();
    inner.last_error = result.as_ref().err().map(ToString::to_string);
  }
}

impl Drop for InFlight {
  fn drop(&mut self) {
    match self.kind {
      RoundTripKind::Mutation => {
        let mut inner = self.tracker.inner.lock();
        inner.pending = inner.pending.saturating_sub(1);
      }
      RoundTripKind::Refetch => self.tracker.refetching.send_modify(|n| *n = n.saturating_sub(1)),
    }
  }
}
