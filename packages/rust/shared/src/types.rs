//! Domain types flowing through the report pipeline.
//!
//! The three content shapes form a strictly forward chain:
//! [`PageContent`] → [`AnalyzedContent`] → [`EnrichedContent`]. Fields only
//! accumulate from one shape to the next; stages build a new value rather
//! than mutating the previous one. The `success` flag is the soft-failure
//! channel: once a stage sets it to `false`, every later stage carries it
//! forward and skips its own work.

use serde::{Deserialize, Serialize};

/// Raw page text as produced by the fetch stage.
///
/// On a soft failure `content` holds a human-readable description of what
/// went wrong — never a raw error chain leaked past the fetch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    /// Page title, or a placeholder when the fetch failed.
    pub title: String,
    /// Readable body text, or the failure description.
    pub content: String,
    /// The URL the page was fetched from.
    pub url: String,
    /// Whether the fetch succeeded.
    pub success: bool,
}

impl PageContent {
    /// Build the conventional failure-shaped value for a fetch that could
    /// not complete.
    pub fn failure(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            content: message.into(),
            url: url.into(),
            success: false,
        }
    }
}

/// Output of the basic analysis stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedContent {
    /// Page title carried forward from the fetch stage.
    pub title: String,
    /// Readable body text carried forward.
    pub content: String,
    /// Basic summary: a leading excerpt of the content.
    pub summary: String,
    /// Character count of the content (`0` when analysis was skipped).
    pub word_count: u64,
    /// The source URL.
    pub url: String,
    /// Soft-failure flag threaded from the previous stage.
    pub success: bool,
}

/// One vocabulary entry extracted by the enrichment stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    /// Written form.
    pub kanji: String,
    /// Pronunciation.
    pub reading: String,
    /// Meaning of the word.
    pub meaning: String,
}

/// The final content report produced by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedContent {
    /// Page title.
    pub title: String,
    /// Readable body text.
    pub content: String,
    /// The basic excerpt summary from the analysis stage.
    pub basic_summary: String,
    /// Model-written summary, or an explanatory message on failure.
    pub ai_summary: String,
    /// Key points extracted by the model; empty on failure.
    pub key_points: Vec<String>,
    /// Vocabulary list extracted by the model; empty on failure.
    pub word_list: Vec<VocabEntry>,
    /// Character count carried forward from the analysis stage.
    pub word_count: u64,
    /// The source URL.
    pub url: String,
    /// Whether the whole chain succeeded.
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_content_failure_shape() {
        let page = PageContent::failure("https://x.test", "HTTP Error: 404");
        assert_eq!(page.title, "Error");
        assert_eq!(page.content, "HTTP Error: 404");
        assert!(!page.success);
    }

    #[test]
    fn analyzed_content_serializes_camel_case() {
        let analyzed = AnalyzedContent {
            title: "Example".into(),
            content: "hello world".into(),
            summary: "hello world".into(),
            word_count: 11,
            url: "https://x.test".into(),
            success: true,
        };
        let json = serde_json::to_value(&analyzed).expect("serialize");
        assert_eq!(json["wordCount"], 11);
        assert!(json.get("word_count").is_none());
    }

    #[test]
    fn enriched_content_roundtrip() {
        let report = EnrichedContent {
            title: "Example".into(),
            content: "hello world".into(),
            basic_summary: "hello world".into(),
            ai_summary: "A greeting.".into(),
            key_points: vec!["greets the world".into()],
            word_list: vec![VocabEntry {
                kanji: "世界".into(),
                reading: "せかい".into(),
                meaning: "world".into(),
            }],
            word_count: 11,
            url: "https://x.test".into(),
            success: true,
        };
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"aiSummary\""));
        assert!(json.contains("\"keyPoints\""));
        let parsed: EnrichedContent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, report);
    }
}
