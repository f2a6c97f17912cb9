//! Page fetching and readable-text extraction.
//!
//! [`HttpFetcher`] is the production [`ContentFetcher`]: it performs the
//! HTTP GET and reduces the raw markup to a title plus readable body text.
//! Conventional failures (unreachable host, non-2xx status, unreadable
//! body) never escape this boundary as errors — they come back as
//! `success=false` [`PageContent`] values carrying a human-readable
//! description, so the pipeline keeps running.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};
use tracing::{debug, warn};

use pagelens_shared::{PageContent, PageLensError, Result};

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("PageLens/", env!("CARGO_PKG_VERSION"));

/// Title used when a page has no usable `<title>` element.
const FALLBACK_TITLE: &str = "Untitled";

// ---------------------------------------------------------------------------
// ContentFetcher
// ---------------------------------------------------------------------------

/// Fetches a page and returns its readable content.
///
/// Implementations must not fail past this boundary: every conventional
/// failure becomes a `success=false` [`PageContent`].
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` and extract title + readable text.
    async fn fetch(&self, url: &str) -> PageContent;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// reqwest-backed fetcher with a descriptive identity and request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| PageLensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// The fallible inner fetch; `Err` carries the human-readable message
    /// that becomes the soft-failure content.
    async fn try_fetch(&self, url: &str) -> std::result::Result<PageContent, String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("the page could not be fetched: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP Error: {}", status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("the page body could not be read: {e}"))?;

        let (title, content) = extract_page(&body);

        debug!(%url, title = %title, content_len = content.len(), "page extracted");

        Ok(PageContent {
            title,
            content,
            url: url.to_string(),
            success: true,
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> PageContent {
        match self.try_fetch(url).await {
            Ok(page) => page,
            Err(message) => {
                warn!(%url, %message, "fetch soft-failed");
                PageContent::failure(url, message)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Text extraction
// ---------------------------------------------------------------------------

/// Elements whose text is never readable content.
const SKIP_TAGS: [&str; 6] = ["script", "style", "noscript", "template", "svg", "iframe"];

/// Extract `(title, readable_text)` from raw HTML.
///
/// The title comes from the `<title>` element (falling back to
/// "Untitled"); the body text is every text node outside script/style-like
/// elements, with entities decoded by the parser and all runs of
/// whitespace collapsed to single spaces.
pub fn extract_page(html: &str) -> (String, String) {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse("title").unwrap();
    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let body_sel = Selector::parse("body").unwrap();
    let mut pieces: Vec<String> = Vec::new();
    match doc.select(&body_sel).next() {
        Some(body) => collect_text(*body, &mut pieces),
        None => collect_text(*doc.root_element(), &mut pieces),
    }

    let content = collapse_whitespace(&pieces.join(" "));
    (title, content)
}

/// Depth-first walk gathering text nodes, skipping non-content elements.
fn collect_text(node: NodeRef<'_, Node>, out: &mut Vec<String>) {
    for child in node.children() {
        match child.value() {
            Node::Element(element) => {
                if !SKIP_TAGS.contains(&element.name()) {
                    collect_text(child, out);
                }
            }
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            _ => {}
        }
    }
}

/// Collapse all whitespace runs to single spaces and trim the ends.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
