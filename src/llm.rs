//! Plan generation service client
//!
//! Talks to an OpenAI-compatible chat completions endpoint using
//! schema-constrained JSON output. The rest of the crate only sees the
//! [`PlanCompletion`] trait so tests can script replies.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::AppConfig;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, Serialize)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("Request timed out after {0}s")]
  Timeout(u64),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),
}

/// ---------------------------------------------------------------------------
/// Prompt
/// ---------------------------------------------------------------------------

/// Everything one generation call needs.
#[derive(Debug, Clone, Serialize)]
pub struct PlanPrompt {
  pub system: String,
  pub user: String,
  pub schema_name: String,
  pub schema: Value,
}

/// Source of raw plan payloads
#[async_trait]
pub trait PlanCompletion: Send + Sync {
  /// Returns the response text, expected to be a JSON document.
  async fn complete(&self, prompt: &PlanPrompt) -> Result<String, LlmError>;
}

/// ---------------------------------------------------------------------------
/// Chat Completions API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage<'a>>,
  response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
  #[serde(rename = "type")]
  format_type: &'a str,
  json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
  name: &'a str,
  strict: bool,
  schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
  content: Option<String>,
  refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
  error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// OpenAI Client
/// ---------------------------------------------------------------------------

pub struct OpenAiClient {
  client: Client,
  api_key: String,
  base_url: String,
  model: String,
}

impl OpenAiClient {
  pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.into(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      model: model.into(),
    }
  }

  pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
    let api_key = config
      .openai_api_key
      .as_deref()
      .filter(|k| !k.trim().is_empty())
      .ok_or(LlmError::MissingApiKey)?;

    Ok(Self::new(api_key, &config.openai_base_url, &config.openai_model))
  }
}

#[async_trait]
impl PlanCompletion for OpenAiClient {
  async fn complete(&self, prompt: &PlanPrompt) -> Result<String, LlmError> {
    let request = ChatRequest {
      model: &self.model,
      messages: vec![
        ChatMessage {
          role: "system",
          content: &prompt.system,
        },
        ChatMessage {
          role: "user",
          content: &prompt.user,
        },
      ],
      response_format: ResponseFormat {
        format_type: "json_schema",
        json_schema: JsonSchemaFormat {
          name: &prompt.schema_name,
          strict: true,
          schema: &prompt.schema,
        },
      },
    };

    debug!(model = %self.model, schema = %prompt.schema_name, "Requesting plan completion");

    let response = self
      .client
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      if let Ok(error_resp) = serde_json::from_str::<ApiErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    let chat: ChatResponse = serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;
    let message = chat
      .choices
      .into_iter()
      .next()
      .map(|c| c.message)
      .ok_or_else(|| LlmError::Parse("No choices in response".to_string()))?;

    if let Some(refusal) = message.refusal {
      return Err(LlmError::Api(format!("Model refused: {}", refusal)));
    }

    let text = message
      .content
      .ok_or_else(|| LlmError::Parse("No text content in response".to_string()))?;

    extract_json(&text)
  }
}

/// Pull the JSON document out of a reply (handles markdown code blocks)
pub fn extract_json(text: &str) -> Result<String, LlmError> {
  if text.trim().starts_with('{') {
    return Ok(text.trim().to_string());
  }

  if let Some(start) = text.find("```json") {
    let start = start + 7;
    if let Some(end) = text[start..].find("```") {
      return Ok(text[start..start + end].trim().to_string());
    }
  }

  if let Some(start) = text.find("```") {
    let start = start + 3;
    // Skip language identifier if present
    let content_start = text[start..]
      .find('\n')
      .map(|i| start + i + 1)
      .unwrap_or(start);
    if let Some(end) = text[content_start..].find("```") {
      return Ok(text[content_start..content_start + end].trim().to_string());
    }
  }

  if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
    if start < end {
      return Ok(text[start..=end].to_string());
    }
  }

  Err(LlmError::Parse("Could not extract JSON from response".to_string()))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::Matcher;
  use serde_json::json;

  fn prompt() -> PlanPrompt {
    PlanPrompt {
      system: "You are a coach".into(),
      user: "Plan my week".into(),
      schema_name: "weekly_workout_plan".into(),
      schema: json!({ "type": "object" }),
    }
  }

  fn chat_body(content: &str) -> String {
    json!({
      "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
  }

  #[test]
  fn test_extract_json_direct() {
    let input = r#"{"monday": "Rest day"}"#;
    let result = extract_json(input).unwrap();
    assert!(result.contains("monday"));
  }

  #[test]
  fn test_extract_json_code_block() {
    let input = r#"Here's your plan:

```json
{"monday": {"mainFocus": "Chest", "exercises": []}}
```

Enjoy!"#;
    let result = extract_json(input).unwrap();
    assert!(result.contains("Chest"));
  }

  #[test]
  fn test_extract_json_fallback() {
    let input = r#"The plan is {"tuesday": "Rest day"} as shown."#;
    let result = extract_json(input).unwrap();
    assert_eq!(result, r#"{"tuesday": "Rest day"}"#);
  }

  #[test]
  fn test_extract_json_rejects_prose() {
    assert!(matches!(extract_json("no plan today"), Err(LlmError::Parse(_))));
  }

  #[test]
  fn test_from_config_requires_key() {
    let config = AppConfig::default();
    assert!(matches!(OpenAiClient::from_config(&config), Err(LlmError::MissingApiKey)));

    let config = AppConfig {
      openai_api_key: Some("sk-test".into()),
      ..AppConfig::default()
    };
    assert!(OpenAiClient::from_config(&config).is_ok());
  }

  #[tokio::test]
  async fn test_complete_sends_schema_and_returns_content() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/chat/completions")
      .match_header("authorization", "Bearer sk-test")
      .match_body(Matcher::PartialJson(json!({
        "model": "gpt-4o-mini",
        "response_format": {
          "type": "json_schema",
          "json_schema": { "name": "weekly_workout_plan", "strict": true }
        }
      })))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(chat_body(r#"{"monday": "Rest day"}"#))
      .create_async()
      .await;

    let client = OpenAiClient::new("sk-test", server.url(), "gpt-4o-mini");
    let text = client.complete(&prompt()).await.unwrap();

    assert_eq!(text, r#"{"monday": "Rest day"}"#);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_complete_maps_api_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/chat/completions")
      .with_status(429)
      .with_body(json!({ "error": { "message": "Rate limit reached" } }).to_string())
      .create_async()
      .await;

    let client = OpenAiClient::new("sk-test", server.url(), "gpt-4o-mini");
    let err = client.complete(&prompt()).await.unwrap_err();

    assert!(matches!(err, LlmError::Api(ref m) if m == "Rate limit reached"));
  }

  #[tokio::test]
  async fn test_complete_rejects_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/chat/completions")
      .with_status(200)
      .with_body("<html>gateway</html>")
      .create_async()
      .await;

    let client = OpenAiClient::new("sk-test", server.url(), "gpt-4o-mini");
    let err = client.complete(&prompt()).await.unwrap_err();

    assert!(matches!(err, LlmError::Parse(_)));
  }
}
