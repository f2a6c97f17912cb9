//! The pipeline runner: sequential stage execution with contract checks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::error::{PipelineError, ViolationList};
use crate::registry::Registry;
use crate::stage::{RunObserver, SilentObserver};

// ---------------------------------------------------------------------------
// Run state & results
// ---------------------------------------------------------------------------

/// Lifecycle of one run.
///
/// `Running` advances one stage index at a time. `Failed` is reached only
/// on a structural failure; a stage reporting `success=false` is legitimate
/// data and keeps the run in `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No stage has executed yet.
    NotStarted,
    /// The stage at this index is executing.
    Running(usize),
    /// All stages ran and every output validated.
    Completed,
    /// A structural failure halted the run.
    Failed,
}

/// Where a suspended run stopped.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// Pipeline the run belonged to.
    pub pipeline: String,
    /// Index of the next stage that would have executed.
    pub next_stage: usize,
    /// The last validated value, ready to feed into `next_stage`.
    pub value: Value,
}

/// Terminal outcome of one pipeline run, owned by the caller.
#[derive(Debug)]
pub enum RunResult {
    /// Every stage ran and the final value validated.
    Success(Value),
    /// A structural failure halted the run.
    Failed(PipelineError),
    /// The run was cancelled at a stage boundary.
    Suspended(Checkpoint),
}

impl RunResult {
    /// Serialize for the invocation surface:
    /// `{status: "success", result}` / `{status: "failed", error: {kind, detail}}`
    /// / `{status: "suspended"}`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Success(value) => json!({ "status": "success", "result": value }),
            Self::Failed(error) => json!({
                "status": "failed",
                "error": { "kind": error.kind(), "detail": error.to_string() },
            }),
            Self::Suspended(_) => json!({ "status": "suspended" }),
        }
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared cancellation signal, observed cooperatively at stage boundaries.
///
/// Cancelling inside a stage's own I/O call is the collaborator's concern;
/// the runner only stops advancing the stage index.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of runs sharing this flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Orchestrates stage execution in declared order and enforces contracts.
///
/// The runner itself is side-effect-free bookkeeping: all I/O happens inside
/// the stages it invokes. Stage order is fixed by the pipeline definition;
/// no reordering or parallelism. Independent runs may execute concurrently
/// since the registry is read-only here and stages hold no per-run state.
pub struct Runner<'a> {
    registry: &'a Registry,
    observer: &'a dyn RunObserver,
    cancel: CancelFlag,
}

impl<'a> Runner<'a> {
    /// Create a runner over a registry, with no observer and no cancellation.
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            observer: &SilentObserver,
            cancel: CancelFlag::new(),
        }
    }

    /// Attach a progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn RunObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Attach a cancellation flag checked at each stage boundary.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the named pipeline against `input` to completion.
    #[instrument(skip_all, fields(pipeline = %pipeline_name))]
    pub async fn run(&self, pipeline_name: &str, input: Value) -> RunResult {
        let definition = match self.registry.resolve(pipeline_name) {
            Ok(definition) => definition,
            Err(error) => {
                warn!(%error, "pipeline resolution failed");
                return RunResult::Failed(error);
            }
        };

        let report = pagelens_contract::validate(&input, &definition.input_contract);
        if !report.is_ok() {
            return RunResult::Failed(PipelineError::ContractViolation {
                pipeline: definition.name.clone(),
                violations: ViolationList(report.violations),
            });
        }

        let total = definition.stages.len();
        let mut state = RunState::NotStarted;
        let mut current = input;

        info!(stages = total, ?state, "starting run");

        for (index, stage) in definition.stages.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(next_stage = index, "run cancelled at stage boundary");
                return RunResult::Suspended(Checkpoint {
                    pipeline: definition.name.clone(),
                    next_stage: index,
                    value: current,
                });
            }

            state = RunState::Running(index);
            debug!(?state, stage = stage.name(), "executing stage");
            self.observer
                .stage_started(&definition.name, stage.name(), index, total);

            let output = match stage.execute(current).await {
                Ok(output) => output,
                Err(error) => {
                    state = RunState::Failed;
                    warn!(?state, stage = stage.name(), %error, "stage failed");
                    return RunResult::Failed(PipelineError::StageFailed {
                        stage: stage.name().to_string(),
                        detail: error.to_string(),
                    });
                }
            };

            let report = pagelens_contract::validate(&output, stage.output_contract());
            if !report.is_ok() {
                state = RunState::Failed;
                warn!(?state, stage = stage.name(), violations = %report.describe(), "output contract violated");
                return RunResult::Failed(PipelineError::StageContractViolation {
                    stage: stage.name().to_string(),
                    violations: ViolationList(report.violations),
                });
            }

            // Soft failures are data: thread the flag forward, keep running.
            let soft_ok = output.get("success").and_then(Value::as_bool).unwrap_or(true);
            if !soft_ok {
                debug!(stage = stage.name(), "stage reported a soft failure");
            }
            self.observer.stage_completed(stage.name(), soft_ok);

            current = output;
        }

        state = RunState::Completed;
        info!(?state, "run complete");
        RunResult::Success(current)
    }
}
