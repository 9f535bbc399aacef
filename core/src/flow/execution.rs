// cartsync/src/flow/execution.rs

//! `Flow::run()`: executes steps in order against shared flow data.

use super::control::{FlowControl, FlowOutcome};
use super::data::FlowData;
use super::definition::{Flow, Handler};
use crate::error::CartError;
use tracing::{event, instrument, Instrument, Level};

enum PhaseResult<Err> {
  Continue,
  Stopped,
  Failed(Err),
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<CartError> + Send + Sync + 'static,
{
  /// Runs every step in order.
  ///
  /// A step whose skip condition holds is passed over. A step with no
  /// handlers is passed over when optional and fails with
  /// `CartError::StepMissing` otherwise. The first handler error aborts the
  /// run and is returned as-is.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(flow = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, data: FlowData<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Flow starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(&data) {
          event!(Level::DEBUG, step = step_name, "Step skipped by condition.");
          continue;
        }
      }

      let on_handlers = self.on.get(step_name).filter(|h| !h.is_empty());
      let after_handlers = self.after.get(step_name).filter(|h| !h.is_empty());

      if on_handlers.is_none() && after_handlers.is_none() {
        if step_def.optional {
          event!(Level::DEBUG, step = step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step = step_name, "Required step has no handlers.");
        return Err(Err::from(CartError::StepMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let step_span = tracing::info_span!("flow_step", step = step_name, step_index = step_idx);
      let result = async {
        for (phase, handlers) in [("on", on_handlers), ("after", after_handlers)] {
          let Some(handlers) = handlers else { continue };
          match run_phase(phase, handlers, &data).await {
            PhaseResult::Continue => {}
            other => return other,
          }
        }
        PhaseResult::Continue
      }
      .instrument(step_span)
      .await;

      match result {
        PhaseResult::Continue => {}
        PhaseResult::Stopped => return Ok(FlowOutcome::Stopped),
        PhaseResult::Failed(e) => return Err(e),
      }
    }

    event!(Level::DEBUG, "Flow completed.");
    Ok(FlowOutcome::Completed)
  }
}

async fn run_phase<TData, Err>(phase: &str, handlers: &[Handler<TData, Err>], data: &FlowData<TData>) -> PhaseResult<Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for handler in handlers {
    match handler(data.clone()).await {
      Ok(FlowControl::Continue) => {}
      Ok(FlowControl::Stop) => {
        event!(Level::INFO, phase, "Flow stopped by handler.");
        return PhaseResult::Stopped;
      }
      Err(e) => {
        event!(Level::WARN, phase, error = %e, "Handler failed.");
        return PhaseResult::Failed(e);
      }
    }
  }
  PhaseResult::Continue
}
