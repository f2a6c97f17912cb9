//! Wiring for the url-report pipeline.

use std::sync::Arc;

use serde_json::json;

use pagelens_fetcher::ContentFetcher;
use pagelens_generator::TextGenerator;
use pagelens_pipeline::{
    PipelineDefinition, PipelineError, Registry, RunObserver, RunResult, Runner,
};
use pagelens_shared::DefaultsConfig;

use crate::contracts;
use crate::stages::{AnalyzeStage, EnrichStage, FetchStage};

/// Name of the URL report pipeline in the registry.
pub const URL_REPORT_PIPELINE: &str = "url-report";

/// Build a registry holding the url-report pipeline:
/// fetch → analyze → enrich.
pub fn build_registry(
    fetcher: Arc<dyn ContentFetcher>,
    generator: Arc<dyn TextGenerator>,
    defaults: &DefaultsConfig,
) -> Result<Registry, PipelineError> {
    let mut registry = Registry::new();
    registry.register(PipelineDefinition {
        name: URL_REPORT_PIPELINE.to_string(),
        description: "Fetch a web page and produce an enriched readable-text report".to_string(),
        stages: vec![
            Arc::new(FetchStage::new(fetcher)),
            Arc::new(AnalyzeStage::new(defaults.summary_chars)),
            Arc::new(EnrichStage::new(generator, defaults.prompt_chars)),
        ],
        input_contract: contracts::report_request_contract(),
        output_contract: contracts::enriched_content_contract(),
    })?;
    Ok(registry)
}

/// Run the url-report pipeline against one URL.
pub async fn run_report(
    registry: &Registry,
    url: &str,
    observer: &dyn RunObserver,
) -> RunResult {
    Runner::new(registry)
        .with_observer(observer)
        .run(URL_REPORT_PIPELINE, json!({ "url": url }))
        .await
}
