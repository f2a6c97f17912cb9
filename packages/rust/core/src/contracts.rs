//! Boundary contracts for the url-report pipeline shapes.
//!
//! These describe the same shapes as the serde-typed structs in
//! `pagelens-shared`; the runtime contracts exist so the runner can check
//! values at trust boundaries (after external collaborator calls) without
//! decoding them first.

use pagelens_contract::{Contract, FieldKind, FieldSpec};

/// Contract for the caller's pipeline input: `{ url }`.
pub fn report_request_contract() -> Contract {
    Contract::new("report-request").require("url", FieldKind::Url)
}

/// Contract for [`pagelens_shared::PageContent`].
///
/// `url` is a plain string here: a failed fetch echoes back whatever the
/// caller passed, well-formed or not.
pub fn page_content_contract() -> Contract {
    Contract::new("page-content")
        .require("title", FieldKind::Str)
        .require("content", FieldKind::Str)
        .require("url", FieldKind::Str)
        .require("success", FieldKind::Bool)
}

/// Contract for [`pagelens_shared::AnalyzedContent`].
pub fn analyzed_content_contract() -> Contract {
    Contract::new("analyzed-content")
        .require("title", FieldKind::Str)
        .require("content", FieldKind::Str)
        .require("summary", FieldKind::Str)
        .require("wordCount", FieldKind::UInt)
        .require("url", FieldKind::Str)
        .require("success", FieldKind::Bool)
}

/// Contract for [`pagelens_shared::EnrichedContent`], the final report.
pub fn enriched_content_contract() -> Contract {
    Contract::new("enriched-content")
        .require("title", FieldKind::Str)
        .require("content", FieldKind::Str)
        .require("basicSummary", FieldKind::Str)
        .require("aiSummary", FieldKind::Str)
        .require("keyPoints", FieldKind::List(Box::new(FieldKind::Str)))
        .require("wordList", FieldKind::List(Box::new(FieldKind::Record(vocab_fields()))))
        .require("wordCount", FieldKind::UInt)
        .require("url", FieldKind::Str)
        .require("success", FieldKind::Bool)
}

/// Contract requested from the text generator by the enrich stage.
pub fn generated_summary_contract() -> Contract {
    Contract::new("generated-summary")
        .require("summary", FieldKind::Str)
        .require("keyPoints", FieldKind::List(Box::new(FieldKind::Str)))
        .require("wordList", FieldKind::List(Box::new(FieldKind::Record(vocab_fields()))))
}

fn vocab_fields() -> Vec<FieldSpec> {
    ["kanji", "reading", "meaning"]
        .into_iter()
        .map(|name| FieldSpec {
            name: name.to_string(),
            kind: FieldKind::Str,
            required: true,
        })
        .collect()
}
