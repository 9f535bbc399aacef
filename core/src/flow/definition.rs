// cartsync/src/flow/definition.rs

//! The `Flow<TData, Err>` struct: step list, handler registration, structural
//! changes.

use super::control::FlowControl;
use super::data::FlowData;
use super::step::{SkipCondition, StepDef};
use crate::error::CartError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A step handler: an async function over the shared flow data.
///
/// Handlers must release any `FlowData` guard before their first `.await`.
pub type Handler<TData, Err> = Box<
  dyn Fn(FlowData<TData>) -> Pin<Box<dyn Future<Output = Result<FlowControl, Err>> + Send>> + Send + Sync,
>;

/// An ordered list of named async steps over `FlowData<TData>`.
///
/// `Err` must be `From<CartError>` so the flow can report its own failures
/// (a required step without handlers) in the caller's error type.
pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<CartError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<CartError> + Send + Sync + 'static,
{
  /// `step_defs` entries are `(name, optional, skip_if)`.
  pub fn new(name: impl Into<String>, step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional, skip_if)| StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      name: name.into(),
      steps,
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  // Misspelled step names are a programming error, not a runtime condition.
  fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("Flow '{}' setup error: step '{}' is not defined.", self.name, step_name);
    }
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<TData>>) {
    self.ensure_step_exists(step_name);
    if let Some(step) = self.steps.iter_mut().find(|s| s.name == step_name) {
      step.skip_if = skip_if;
    }
  }

  /// Registers the main handler(s) of a step. Handlers run in registration order.
  pub fn on<F, UserErr>(&mut self, step_name: &str, handler_fn: impl Fn(FlowData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<FlowControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = wrap_handler(handler_fn);
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Registers a handler that runs after all `on` handlers of the step.
  pub fn after<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(FlowData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<FlowControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = wrap_handler(handler_fn);
    self.after.entry(step_name.to_string()).or_default().push(handler);
  }
}

fn wrap_handler<TData, Err, F, UserErr>(
  handler_fn: impl Fn(FlowData<TData>) -> F + Send + Sync + 'static,
) -> Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  F: Future<Output = Result<FlowControl, UserErr>> + Send + 'static,
  UserErr: Into<Err> + Send + Sync + 'static,
{
  Box::new(move |data| {
    let user_fut = handler_fn(data);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}
