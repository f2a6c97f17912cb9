//! The [`Stage`] trait and run observation hooks.

use async_trait::async_trait;
use serde_json::Value;

use pagelens_contract::Contract;
use pagelens_shared::Result;

/// One named, ordered transformation step in a pipeline.
///
/// A stage accepts a value matching its input contract and produces a value
/// matching its output contract. `execute` may perform I/O (delegate to a
/// fetcher or a text generator) and must hold no per-run state, so multiple
/// independent runs can share one stage instance.
///
/// Failure discipline: a recoverable condition (network error, malformed
/// model response) is returned as a contract-conformant value carrying
/// `success=false` and a diagnostic message — it does not abort the run.
/// A stage must check the incoming value's `success` flag first and
/// short-circuit to a canned failure-shaped output, without attempting its
/// own work, when the flag is already false. Returning `Err` is reserved
/// for programming-level defects and halts the run.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable stage name used in diagnostics and logs.
    fn name(&self) -> &str;

    /// Contract the incoming value must satisfy.
    fn input_contract(&self) -> &Contract;

    /// Contract the produced value must satisfy.
    fn output_contract(&self) -> &Contract;

    /// Transform the input into the output value.
    async fn execute(&self, input: Value) -> Result<Value>;
}

/// Progress callback for observing a pipeline run.
pub trait RunObserver: Send + Sync {
    /// Called before a stage executes.
    fn stage_started(&self, pipeline: &str, stage: &str, index: usize, total: usize);

    /// Called after a stage's output passed contract validation.
    /// `soft_ok` is the `success` flag carried by the output value.
    fn stage_completed(&self, stage: &str, soft_ok: bool);
}

/// No-op observer for headless/test usage.
pub struct SilentObserver;

impl RunObserver for SilentObserver {
    fn stage_started(&self, _pipeline: &str, _stage: &str, _index: usize, _total: usize) {}
    fn stage_completed(&self, _stage: &str, _soft_ok: bool) {}
}
