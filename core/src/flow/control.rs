// cartsync/src/flow/control.rs

//! Signals for controlling flow execution and the outcome of a run.

/// Returned by each step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  Continue,
  /// Halt the flow now. Remaining handlers and steps do not run.
  Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  /// Every step that was not skipped ran to completion.
  Completed,
  /// A handler returned `FlowControl::Stop`.
  Stopped,
}
