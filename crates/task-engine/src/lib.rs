//! Task orchestration core.
//!
//! One task runs at a time: the engine attaches a debugging session to the
//! active tab, then repeatedly reads page state, asks the planner for the
//! next action, appends it to the ledger and executes it, until a terminal
//! operation, a planner stop, the step limit, an error, or an interrupt ends
//! the run.
//! Every state change is broadcast to subscribers; cancellation is
//! cooperative and observed at fixed checkpoints.

pub mod config;
pub mod context;
pub mod engine;
pub mod ledger;
pub mod traits;

pub use config::EngineConfig;
pub use context::TaskContext;
pub use engine::TaskEngine;
pub use ledger::Ledger;
pub use traits::{
    ErrorHook, ExtensionGate, NoopExecutor, NoopExtensionGate, NoopPlanner, OperationExecutor,
    PageReader, PlannedStep, Planner, PlannerRequest,
};
