//! PageLens core: the url-report pipeline assembled from its stages.
//!
//! This crate wires the generic pipeline machinery to the concrete
//! domain: fetch a page's readable text, analyze it into a basic
//! summary with a character count, and enrich it with a model-generated
//! summary, key points, and vocabulary. [`build_registry`] produces the
//! registry the CLI runs against; [`run_report`] drives one report.

pub mod contracts;
pub mod report;
pub mod stages;

pub use report::{URL_REPORT_PIPELINE, build_registry, run_report};
pub use stages::{
    AI_SUMMARY_SKIPPED, ANALYSIS_SKIPPED_SUMMARY, AnalyzeStage, EnrichStage, FetchStage,
    ReportRequest,
};
