//! The three concrete stages of the url-report pipeline.
//!
//! Each stage decodes its JSON input into the typed shape its contract
//! already admitted, does its work, and serializes a fresh value. The
//! soft-failure discipline is uniform: check the incoming `success` flag
//! first, and short-circuit to a canned failure-shaped output without
//! touching any collaborator when it is false.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use pagelens_contract::Contract;
use pagelens_fetcher::ContentFetcher;
use pagelens_generator::TextGenerator;
use pagelens_pipeline::Stage;
use pagelens_shared::{AnalyzedContent, EnrichedContent, PageContent, PageLensError, Result, VocabEntry};

use crate::contracts;

/// Summary used when analysis is skipped because the fetch soft-failed.
pub const ANALYSIS_SKIPPED_SUMMARY: &str =
    "Analysis was skipped because the page content could not be fetched.";

/// AI summary used when enrichment is skipped because an earlier stage
/// soft-failed.
pub const AI_SUMMARY_SKIPPED: &str =
    "No AI summary was produced because the page content could not be fetched.";

/// Decode a contract-admitted input into its typed shape.
///
/// A failure here is a programming defect (the contract admitted a value
/// the stage cannot read) and halts the run.
fn decode<T: DeserializeOwned>(stage: &str, input: Value) -> Result<T> {
    serde_json::from_value(input).map_err(|e| {
        PageLensError::validation(format!("stage '{stage}' could not decode its input: {e}"))
    })
}

fn encode<T: Serialize>(stage: &str, output: &T) -> Result<Value> {
    serde_json::to_value(output).map_err(|e| {
        PageLensError::validation(format!("stage '{stage}' could not encode its output: {e}"))
    })
}

// ---------------------------------------------------------------------------
// FetchStage
// ---------------------------------------------------------------------------

/// The request accepted by the pipeline: one URL to report on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    /// The page to fetch and analyze.
    pub url: String,
}

/// Fetches the page and extracts its readable text.
pub struct FetchStage {
    fetcher: Arc<dyn ContentFetcher>,
    input: Contract,
    output: Contract,
}

impl FetchStage {
    /// Create the stage around a fetcher.
    pub fn new(fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            fetcher,
            input: contracts::report_request_contract(),
            output: contracts::page_content_contract(),
        }
    }
}

#[async_trait]
impl Stage for FetchStage {
    fn name(&self) -> &str {
        "fetch-url"
    }

    fn input_contract(&self) -> &Contract {
        &self.input
    }

    fn output_contract(&self) -> &Contract {
        &self.output
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let request: ReportRequest = decode(self.name(), input)?;
        info!(url = %request.url, "fetching page content");

        // The fetcher never fails past its boundary; a bad fetch comes
        // back as a success=false PageContent.
        let page = self.fetcher.fetch(&request.url).await;
        encode(self.name(), &page)
    }
}

// ---------------------------------------------------------------------------
// AnalyzeStage
// ---------------------------------------------------------------------------

/// Basic analysis: a leading excerpt as summary plus a character count.
///
/// Pure function of its input: no I/O, no state. The count is of
/// characters, not segmented words — the upstream behavior is preserved
/// deliberately.
pub struct AnalyzeStage {
    summary_chars: usize,
    input: Contract,
    output: Contract,
}

impl AnalyzeStage {
    /// Create the stage with the excerpt length in characters.
    pub fn new(summary_chars: usize) -> Self {
        Self {
            summary_chars,
            input: contracts::page_content_contract(),
            output: contracts::analyzed_content_contract(),
        }
    }
}

#[async_trait]
impl Stage for AnalyzeStage {
    fn name(&self) -> &str {
        "analyze-content"
    }

    fn input_contract(&self) -> &Contract {
        &self.input
    }

    fn output_contract(&self) -> &Contract {
        &self.output
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let page: PageContent = decode(self.name(), input)?;

        if !page.success {
            let analyzed = AnalyzedContent {
                title: page.title,
                content: page.content,
                summary: ANALYSIS_SKIPPED_SUMMARY.to_string(),
                word_count: 0,
                url: page.url,
                success: false,
            };
            return encode(self.name(), &analyzed);
        }

        info!(title = %page.title, "analyzing content");

        let word_count = page.content.chars().count() as u64;
        let summary = excerpt(&page.content, self.summary_chars);

        let analyzed = AnalyzedContent {
            title: page.title,
            content: page.content,
            summary,
            word_count,
            url: page.url,
            success: true,
        };
        encode(self.name(), &analyzed)
    }
}

/// First `max_chars` characters, with an ellipsis when truncated.
fn excerpt(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let mut head: String = content.chars().take(max_chars).collect();
        head.push_str("...");
        head
    }
}

// ---------------------------------------------------------------------------
// EnrichStage
// ---------------------------------------------------------------------------

/// The structured value the model is asked to produce.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedSummary {
    summary: String,
    key_points: Vec<String>,
    word_list: Vec<VocabEntry>,
}

/// Model-assisted enrichment: summary, key points, and vocabulary.
pub struct EnrichStage {
    generator: Arc<dyn TextGenerator>,
    prompt_chars: usize,
    input: Contract,
    output: Contract,
    requested: Contract,
}

impl EnrichStage {
    /// Create the stage around a generator, limiting how much page content
    /// goes into the prompt.
    pub fn new(generator: Arc<dyn TextGenerator>, prompt_chars: usize) -> Self {
        Self {
            generator,
            prompt_chars,
            input: contracts::analyzed_content_contract(),
            output: contracts::enriched_content_contract(),
            requested: contracts::generated_summary_contract(),
        }
    }

    fn build_prompt(&self, analyzed: &AnalyzedContent) -> String {
        format!(
            "Analyze the content of the following web page.\n\n\
             Title: {title}\n\
             URL: {url}\n\
             Content: {content}\n\n\
             Respond with only a JSON object of this exact shape:\n\
             {{\n\
             \x20 \"summary\": \"a detailed summary of the content in 3-5 sentences\",\n\
             \x20 \"keyPoints\": [\"important point 1\", \"important point 2\", \"important point 3\"],\n\
             \x20 \"wordList\": [{{\"kanji\": \"written form\", \"reading\": \"how it is read\", \"meaning\": \"what the word means\"}}]\n\
             }}\n\n\
             The wordList must cover the notable vocabulary appearing in the page.",
            title = analyzed.title,
            url = analyzed.url,
            content = truncate_for_prompt(&analyzed.content, self.prompt_chars),
        )
    }

    /// Failure-shaped output carrying everything forward with empty
    /// enrichment fields.
    fn failure_output(analyzed: AnalyzedContent, ai_summary: String) -> EnrichedContent {
        EnrichedContent {
            title: analyzed.title,
            content: analyzed.content,
            basic_summary: analyzed.summary,
            ai_summary,
            key_points: Vec::new(),
            word_list: Vec::new(),
            word_count: analyzed.word_count,
            url: analyzed.url,
            success: false,
        }
    }
}

#[async_trait]
impl Stage for EnrichStage {
    fn name(&self) -> &str {
        "ai-summary"
    }

    fn input_contract(&self) -> &Contract {
        &self.input
    }

    fn output_contract(&self) -> &Contract {
        &self.output
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let analyzed: AnalyzedContent = decode(self.name(), input)?;

        if !analyzed.success {
            let skipped = Self::failure_output(analyzed, AI_SUMMARY_SKIPPED.to_string());
            return encode(self.name(), &skipped);
        }

        info!(title = %analyzed.title, "generating AI summary");

        let prompt = self.build_prompt(&analyzed);
        match self.generator.generate(&prompt, &self.requested).await {
            Ok(value) => {
                let generated: GeneratedSummary = decode(self.name(), value)?;
                let enriched = EnrichedContent {
                    title: analyzed.title,
                    content: analyzed.content,
                    basic_summary: analyzed.summary,
                    ai_summary: generated.summary,
                    key_points: generated.key_points,
                    word_list: generated.word_list,
                    word_count: analyzed.word_count,
                    url: analyzed.url,
                    success: true,
                };
                encode(self.name(), &enriched)
            }
            Err(error) => {
                // Generation failures are recoverable: report them as data.
                warn!(%error, "AI summary generation failed");
                let message = format!("AI summary generation failed: {error}");
                let failed = Self::failure_output(analyzed, message);
                encode(self.name(), &failed)
            }
        }
    }
}

/// Limit page content included in a prompt, marking the cut.
fn truncate_for_prompt(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let head: String = content.chars().take(max_chars).collect();
        format!("{head}\n\n[... content truncated for the model context window ...]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -- test doubles -------------------------------------------------------

    /// Fetcher returning a fixed page and counting invocations.
    struct StubFetcher {
        pub page: PageContent,
        pub calls: AtomicUsize,
    }

    impl StubFetcher {
        pub fn returning(page: PageContent) -> Arc<Self> {
            Arc::new(Self {
                page,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ContentFetcher for StubFetcher {
        async fn fetch(&self, _url: &str) -> PageContent {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.page.clone()
        }
    }

    /// Generator returning a fixed value (or failing) and counting calls.
    struct StubGenerator {
        pub response: Value,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl StubGenerator {
        pub fn returning(response: Value) -> Arc<Self> {
            Arc::new(Self {
                response,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing() -> Arc<Self> {
            Arc::new(Self {
                response: Value::Null,
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, _prompt: &str, _requested: &Contract) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PageLensError::Generation("model call timed out".into()))
            } else {
                Ok(self.response.clone())
            }
        }
    }

    fn hello_page() -> PageContent {
        PageContent {
            title: "Example".into(),
            content: "hello world".into(),
            url: "https://x.test".into(),
            success: true,
        }
    }

    fn generated() -> Value {
        json!({
            "summary": "A tiny greeting page.",
            "keyPoints": ["it greets the world"],
            "wordList": [{"kanji": "世界", "reading": "せかい", "meaning": "world"}],
        })
    }

    // -- FetchStage ---------------------------------------------------------

    #[tokio::test]
    async fn fetch_stage_output_conforms_to_its_contract() {
        let stage = FetchStage::new(StubFetcher::returning(hello_page()));
        let output = stage
            .execute(json!({"url": "https://x.test"}))
            .await
            .expect("execute");

        let report = pagelens_contract::validate(&output, stage.output_contract());
        assert!(report.is_ok(), "{}", report.describe());
        assert_eq!(output["title"], "Example");
    }

    // -- AnalyzeStage -------------------------------------------------------

    #[tokio::test]
    async fn analyze_counts_characters() {
        let stage = AnalyzeStage::new(200);
        let input = serde_json::to_value(hello_page()).unwrap();
        let output = stage.execute(input).await.expect("execute");

        // "hello world" is 11 characters.
        assert_eq!(output["wordCount"], 11);
        assert_eq!(output["summary"], "hello world");
        assert_eq!(output["success"], true);
    }

    #[tokio::test]
    async fn analyze_is_idempotent() {
        let stage = AnalyzeStage::new(200);
        let input = serde_json::to_value(hello_page()).unwrap();
        let first = stage.execute(input.clone()).await.expect("first run");
        let second = stage.execute(input).await.expect("second run");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn analyze_truncates_long_content_with_ellipsis() {
        let stage = AnalyzeStage::new(200);
        let mut page = hello_page();
        page.content = "x".repeat(300);
        let output = stage
            .execute(serde_json::to_value(page).unwrap())
            .await
            .expect("execute");

        let summary = output["summary"].as_str().unwrap();
        assert_eq!(summary.chars().count(), 203);
        assert!(summary.ends_with("..."));
        assert_eq!(output["wordCount"], 300);
    }

    #[tokio::test]
    async fn analyze_skips_failed_input() {
        let stage = AnalyzeStage::new(200);
        let failed = PageContent::failure("https://x.test", "HTTP Error: 404");
        let output = stage
            .execute(serde_json::to_value(failed).unwrap())
            .await
            .expect("execute");

        assert_eq!(output["summary"], ANALYSIS_SKIPPED_SUMMARY);
        assert_eq!(output["wordCount"], 0);
        assert_eq!(output["success"], false);
        // The failure description is carried forward, not replaced.
        assert_eq!(output["content"], "HTTP Error: 404");
    }

    // -- EnrichStage --------------------------------------------------------

    fn analyzed_ok() -> AnalyzedContent {
        AnalyzedContent {
            title: "Example".into(),
            content: "hello world".into(),
            summary: "hello world".into(),
            word_count: 11,
            url: "https://x.test".into(),
            success: true,
        }
    }

    #[tokio::test]
    async fn enrich_builds_full_report() {
        let generator = StubGenerator::returning(generated());
        let stage = EnrichStage::new(generator.clone(), 12_000);
        let output = stage
            .execute(serde_json::to_value(analyzed_ok()).unwrap())
            .await
            .expect("execute");

        let report = pagelens_contract::validate(&output, stage.output_contract());
        assert!(report.is_ok(), "{}", report.describe());
        assert_eq!(output["aiSummary"], "A tiny greeting page.");
        assert_eq!(output["basicSummary"], "hello world");
        assert_eq!(output["wordList"][0]["meaning"], "world");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn enrich_never_calls_the_generator_on_failed_input() {
        let generator = StubGenerator::returning(generated());
        let stage = EnrichStage::new(generator.clone(), 12_000);

        let mut analyzed = analyzed_ok();
        analyzed.success = false;
        analyzed.summary = ANALYSIS_SKIPPED_SUMMARY.into();
        analyzed.word_count = 0;

        let output = stage
            .execute(serde_json::to_value(analyzed).unwrap())
            .await
            .expect("execute");

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(output["aiSummary"], AI_SUMMARY_SKIPPED);
        assert_eq!(output["keyPoints"], json!([]));
        assert_eq!(output["wordList"], json!([]));
        assert_eq!(output["success"], false);
    }

    #[tokio::test]
    async fn generation_error_becomes_a_soft_failure() {
        let generator = StubGenerator::failing();
        let stage = EnrichStage::new(generator.clone(), 12_000);
        let output = stage
            .execute(serde_json::to_value(analyzed_ok()).unwrap())
            .await
            .expect("execute");

        // Still a contract-conformant value; the run keeps going.
        let report = pagelens_contract::validate(&output, stage.output_contract());
        assert!(report.is_ok(), "{}", report.describe());
        assert_eq!(output["success"], false);
        let message = output["aiSummary"].as_str().unwrap();
        assert!(message.contains("timed out"));
        assert_eq!(output["wordList"], json!([]));
    }

    #[tokio::test]
    async fn prompt_carries_title_url_and_truncated_content() {
        struct CapturingGenerator {
            seen: std::sync::Mutex<String>,
        }

        #[async_trait]
        impl TextGenerator for CapturingGenerator {
            async fn generate(&self, prompt: &str, _requested: &Contract) -> Result<Value> {
                *self.seen.lock().unwrap() = prompt.to_string();
                Ok(generated())
            }
        }

        let generator = Arc::new(CapturingGenerator {
            seen: std::sync::Mutex::new(String::new()),
        });
        let stage = EnrichStage::new(generator.clone(), 5);

        stage
            .execute(serde_json::to_value(analyzed_ok()).unwrap())
            .await
            .expect("execute");

        let prompt = generator.seen.lock().unwrap().clone();
        assert!(prompt.contains("Title: Example"));
        assert!(prompt.contains("URL: https://x.test"));
        assert!(prompt.contains("hello\n"));
        assert!(prompt.contains("content truncated"));
        assert!(prompt.contains("\"keyPoints\""));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        // Multibyte characters must not be split.
        let text = "日本語のテキスト";
        assert_eq!(excerpt(text, 3), "日本語...");
        assert_eq!(excerpt(text, 100), text);
    }
}
