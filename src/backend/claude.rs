//! Backend for Anthropic's Messages API.
//!
//! Endpoint: `/v1/messages`. Auth via `x-api-key`, versioned with
//! `anthropic-version`.

use super::{missing_text, redact_key, send_json, LlmRequest, LlmResponse, TextProvider};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct ClaudeProvider {
    api_key: String,
}

impl std::fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("api_key", &redact_key(&self.api_key))
            .finish()
    }
}

impl ClaudeProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// The plan call sends a single user message and no `system` field.
    fn build_body(request: &LlmRequest) -> Value {
        json!({
            "model": request.model,
            "max_tokens": request.config.max_tokens,
            "messages": [{ "role": "user", "content": request.prompt }],
        })
    }

    fn build_http_request(&self, client: &Client, url: &str, body: &Value) -> reqwest::RequestBuilder {
        client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
    }

    fn extract_text(json_resp: &Value) -> Option<&str> {
        json_resp
            .get("content")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
    }
}

#[async_trait]
impl TextProvider for ClaudeProvider {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));
        let req = self.build_http_request(client, &url, &Self::build_body(request));

        let (json_resp, status) = send_json(self.name(), req).await?;
        let text = Self::extract_text(&json_resp)
            .ok_or_else(|| missing_text(self.name(), "content[0].text"))?
            .to_string();

        Ok(LlmResponse {
            text,
            status,
            metadata: json_resp.get("usage").cloned(),
        })
    }

    fn name(&self) -> &'static str {
        "Claude"
    }
}
