// cartsync/src/flow/mod.rs

//! Ordered async step flows. Each cart round trip (add, refetch) is a `Flow`
//! over a small per-request context; handlers share it through `FlowData`.

pub mod control;
pub mod data;
pub mod definition;
pub mod execution;
pub mod step;

pub use control::{FlowControl, FlowOutcome};
pub use data::FlowData;
pub use definition::{Flow, Handler};
pub use step::{SkipCondition, StepDef};
