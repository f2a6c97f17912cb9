//! Structural pipeline failures.
//!
//! These are the halting tier of the error model: misconfiguration or
//! programming defects, surfaced to the caller verbatim. Recoverable
//! conditions never appear here — they ride inside stage outputs as
//! `success=false` values.

use pagelens_contract::Violation;

/// Wrapper rendering a violation list for error messages.
#[derive(Debug, Clone)]
pub struct ViolationList(pub Vec<Violation>);

impl std::fmt::Display for ViolationList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// A structural failure that halts a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No pipeline is registered under the requested name.
    #[error("unknown pipeline '{name}'")]
    UnknownPipeline { name: String },

    /// A pipeline was registered twice under one name.
    #[error("pipeline '{name}' is already registered")]
    DuplicateName { name: String },

    /// The caller's input did not match the pipeline's input contract.
    #[error("input for pipeline '{pipeline}' violated its contract: {violations}")]
    ContractViolation {
        pipeline: String,
        violations: ViolationList,
    },

    /// A stage produced output not matching its declared output contract.
    #[error("output of stage '{stage}' violated its contract: {violations}")]
    StageContractViolation {
        stage: String,
        violations: ViolationList,
    },

    /// A stage returned a hard error from `execute`.
    #[error("stage '{stage}' failed: {detail}")]
    StageFailed { stage: String, detail: String },
}

impl PipelineError {
    /// Stable machine-readable kind for the serialized result surface.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownPipeline { .. } => "unknown_pipeline",
            Self::DuplicateName { .. } => "duplicate_name",
            Self::ContractViolation { .. } => "contract_violation",
            Self::StageContractViolation { .. } => "stage_contract_violation",
            Self::StageFailed { .. } => "stage_failed",
        }
    }
}
