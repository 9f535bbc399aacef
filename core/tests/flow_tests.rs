// tests/flow_tests.rs
mod common;

use cartsync::flow::Handler;
use cartsync::{CartError, Flow, FlowControl, FlowData, FlowOutcome, SkipCondition};
use common::setup_tracing;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Trace {
  visited: Vec<String>,
  stop_at: Option<String>,
}

fn recorder(step: &'static str) -> Handler<Trace, CartError> {
  Box::new(move |data: FlowData<Trace>| {
    Box::pin(async move {
      let mut trace = data.write();
      trace.visited.push(step.to_string());
      if trace.stop_at.as_deref() == Some(step) {
        return Ok(FlowControl::Stop);
      }
      Ok(FlowControl::Continue)
    })
  })
}

#[tokio::test]
async fn runs_steps_in_declared_order() {
  setup_tracing();
  let mut flow = Flow::<Trace, CartError>::new("ordered", &[("a", false, None), ("b", false, None), ("c", false, None)]);
  flow.on("c", recorder("c"));
  flow.on("a", recorder("a"));
  flow.on("b", recorder("b"));

  let data = FlowData::new(Trace::default());
  assert_eq!(flow.run(data.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(data.read().visited, vec!["a", "b", "c"]);
  assert_eq!(flow.step_names(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn stop_ends_the_run_early() {
  setup_tracing();
  let mut flow = Flow::<Trace, CartError>::new("stopping", &[("a", false, None), ("b", false, None), ("c", false, None)]);
  flow.on("a", recorder("a"));
  flow.on("b", recorder("b"));
  flow.on("c", recorder("c"));

  let data = FlowData::new(Trace {
    stop_at: Some("b".to_string()),
    ..Trace::default()
  });
  assert_eq!(flow.run(data.clone()).await.unwrap(), FlowOutcome::Stopped);
  assert_eq!(data.read().visited, vec!["a", "b"]);
}

#[tokio::test]
async fn first_error_aborts_and_is_returned() {
  setup_tracing();
  let mut flow = Flow::<Trace, CartError>::new("failing", &[("a", false, None), ("b", false, None), ("c", false, None)]);
  flow.on("a", recorder("a"));
  flow.on("b", |_data: FlowData<Trace>| async { Err::<FlowControl, _>(CartError::invalid_quantity("x")) });
  flow.on("c", recorder("c"));

  let data = FlowData::new(Trace::default());
  let err = flow.run(data.clone()).await.unwrap_err();
  assert!(matches!(err, CartError::InvalidQuantity { ref input } if input == "x"));
  assert_eq!(data.read().visited, vec!["a"]);
}

#[tokio::test]
async fn skip_condition_bypasses_step() {
  setup_tracing();
  let skip_b: SkipCondition<Trace> = Arc::new(|data: &FlowData<Trace>| data.read().visited.contains(&"a".to_string()));
  let mut flow = Flow::<Trace, CartError>::new("skipping", &[("a", false, None), ("b", false, Some(skip_b)), ("c", false, None)]);
  flow.on("a", recorder("a"));
  flow.on("b", recorder("b"));
  flow.on("c", recorder("c"));

  let data = FlowData::new(Trace::default());
  flow.run(data.clone()).await.unwrap();
  assert_eq!(data.read().visited, vec!["a", "c"]);

  // Clearing the condition brings the step back.
  flow.set_skip_condition("b", None);
  let data = FlowData::new(Trace::default());
  flow.run(data.clone()).await.unwrap();
  assert_eq!(data.read().visited, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn required_step_without_handlers_fails() {
  setup_tracing();
  let mut flow = Flow::<Trace, CartError>::new("incomplete", &[("a", false, None), ("missing", false, None)]);
  flow.on("a", recorder("a"));

  let err = flow.run(FlowData::new(Trace::default())).await.unwrap_err();
  assert!(matches!(err, CartError::StepMissing { ref step_name } if step_name == "missing"));
}

#[tokio::test]
async fn optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut flow = Flow::<Trace, CartError>::new("optional", &[("maybe", true, None), ("a", false, None)]);
  flow.on("a", recorder("a"));

  let data = FlowData::new(Trace::default());
  assert_eq!(flow.run(data.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(data.read().visited, vec!["a"]);
}

#[tokio::test]
async fn after_handlers_run_once_on_handlers_finish() {
  setup_tracing();
  let mut flow = Flow::<Trace, CartError>::new("phased", &[("a", false, None), ("b", false, None)]);
  flow.after("a", recorder("a:after"));
  flow.on("a", recorder("a:on"));
  flow.on("a", recorder("a:on2"));
  flow.after("b", recorder("b:after"));

  let data = FlowData::new(Trace::default());
  flow.run(data.clone()).await.unwrap();
  assert_eq!(data.read().visited, vec!["a:on", "a:on2", "a:after", "b:after"]);
}

#[test]
#[should_panic(expected = "step 'nope' is not defined")]
fn registering_unknown_step_panics() {
  let mut flow = Flow::<Trace, CartError>::new("typo", &[("a", false, None)]);
  flow.on("nope", recorder("nope"));
}
