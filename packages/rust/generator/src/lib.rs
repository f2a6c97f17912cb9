//! Structured text generation against a requested contract.
//!
//! [`TextGenerator`] is the model-call boundary of the pipeline: given a
//! prompt and a [`Contract`] describing the output shape, it returns a JSON
//! value already validated against that contract, or an error. The enrich
//! stage converts any error into a soft failure; nothing here halts a run
//! by itself.
//!
//! [`OpenRouterGenerator`] is the production implementation, talking to the
//! OpenRouter chat-completions API in JSON output mode.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use pagelens_contract::Contract;
use pagelens_shared::{AppConfig, PageLensError, Result, validate_api_key};

/// Maximum tokens requested per generation call.
const MAX_TOKENS: u32 = 16_384;

// ---------------------------------------------------------------------------
// TextGenerator
// ---------------------------------------------------------------------------

/// Generates a structured value conforming to a requested contract.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run `prompt` through the model and return its structured output,
    /// validated against `requested`.
    async fn generate(&self, prompt: &str, requested: &Contract) -> Result<Value>;
}

// ---------------------------------------------------------------------------
// Wire types (chat-completions API)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// OpenRouterGenerator
// ---------------------------------------------------------------------------

/// Chat-completions generator backed by the OpenRouter API.
pub struct OpenRouterGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenRouterGenerator {
    /// Create a generator with explicit endpoint, model, and key.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Create a generator from the application config, reading the API key
    /// from the configured environment variable.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = validate_api_key(config)?;
        Ok(Self::new(
            config.openrouter.base_url.clone(),
            config.openrouter.default_model.clone(),
            api_key,
        ))
    }
}

#[async_trait]
impl TextGenerator for OpenRouterGenerator {
    #[instrument(skip_all, fields(model = %self.model, contract = %requested.name))]
    async fn generate(&self, prompt: &str, requested: &Contract) -> Result<Value> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: 0.0,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PageLensError::Generation(format!("generation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageLensError::Generation(format!(
                "generation API returned HTTP {}",
                status.as_u16()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PageLensError::Generation(format!("unreadable API response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PageLensError::Generation("model returned no choices".into()))?;

        debug!(content_len = content.len(), "model responded");

        let value: Value = serde_json::from_str(&content).map_err(|e| {
            PageLensError::Generation(format!("model output was not valid JSON: {e}"))
        })?;

        // Trust boundary: the model's output is external data and must
        // conform to the requested contract before the stage may use it.
        let report = pagelens_contract::validate(&value, requested);
        if !report.is_ok() {
            return Err(PageLensError::Generation(format!(
                "model output violated the requested contract: {}",
                report.describe()
            )));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelens_contract::FieldKind;
    use serde_json::json;

    fn summary_contract() -> Contract {
        Contract::new("generated-summary")
            .require("summary", FieldKind::Str)
            .require("keyPoints", FieldKind::List(Box::new(FieldKind::Str)))
    }

    async fn mock_completion(server: &wiremock::MockServer, content: &str) {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        });
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn conforming_output_is_returned() {
        let server = wiremock::MockServer::start().await;
        mock_completion(
            &server,
            r#"{"summary": "A page.", "keyPoints": ["one", "two"]}"#,
        )
        .await;

        let generator = OpenRouterGenerator::new(server.uri(), "test/model", "sk-test");
        let value = generator
            .generate("summarize this", &summary_contract())
            .await
            .expect("generate");

        assert_eq!(value["summary"], "A page.");
        assert_eq!(value["keyPoints"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_json_output_is_an_error() {
        let server = wiremock::MockServer::start().await;
        mock_completion(&server, "Sure! Here is your summary: ...").await;

        let generator = OpenRouterGenerator::new(server.uri(), "test/model", "sk-test");
        let err = generator
            .generate("summarize this", &summary_contract())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn contract_violating_output_is_an_error() {
        let server = wiremock::MockServer::start().await;
        mock_completion(&server, r#"{"summary": 42}"#).await;

        let generator = OpenRouterGenerator::new(server.uri(), "test/model", "sk-test");
        let err = generator
            .generate("summarize this", &summary_contract())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("violated the requested contract"));
        assert!(message.contains("summary"));
        assert!(message.contains("keyPoints"));
    }

    #[tokio::test]
    async fn api_error_status_is_an_error() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let generator = OpenRouterGenerator::new(server.uri(), "test/model", "sk-test");
        let err = generator
            .generate("summarize this", &summary_contract())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("HTTP 429"));
    }

    #[tokio::test]
    async fn request_carries_json_mode_and_model() {
        let server = wiremock::MockServer::start().await;
        mock_completion(&server, r#"{"summary": "ok", "keyPoints": []}"#).await;

        let generator = OpenRouterGenerator::new(server.uri(), "test/model", "sk-test");
        generator
            .generate("prompt", &summary_contract())
            .await
            .expect("generate");

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["model"], "test/model");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["content"], "prompt");
    }
}
