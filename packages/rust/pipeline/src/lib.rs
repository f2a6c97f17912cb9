//! The typed, schema-validated sequential pipeline core.
//!
//! Stages declare input and output contracts; the [`Runner`] executes them
//! in declared order, validating every boundary and threading the
//! soft-failure flag through without halting. Structural failures (unknown
//! pipeline, a stage output violating its own contract) halt the run as
//! [`PipelineError`]s; recoverable conditions travel as `success=false`
//! values inside stage outputs.
//!
//! The [`Registry`] is an explicit value constructed at startup and passed
//! by reference to the runner — no process-wide globals.

pub mod error;
pub mod registry;
pub mod runner;
pub mod stage;

pub use error::{PipelineError, ViolationList};
pub use registry::{PipelineDefinition, Registry};
pub use runner::{CancelFlag, Checkpoint, RunResult, RunState, Runner};
pub use stage::{RunObserver, SilentObserver, Stage};
