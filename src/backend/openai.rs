//! Backend for OpenAI's chat completions API.
//!
//! Endpoint: `/v1/chat/completions`. Auth via `Authorization: Bearer {key}`.
//! The plan request always carries the coach persona as its system message.

use super::{missing_text, redact_key, send_json, LlmRequest, LlmResponse, TextProvider};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for OpenAI chat models.
///
/// # Example
///
/// ```
/// use fitplan::backend::OpenAiProvider;
///
/// let provider = OpenAiProvider::new("sk-...").with_organization("org-abc");
/// ```
#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: String,
    /// Optional organization ID. If set, sent as `OpenAI-Organization: {org}`.
    organization: Option<String>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &redact_key(&self.api_key))
            .field("organization", &self.organization)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            organization: None,
        }
    }

    /// Set the organization ID header.
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    fn build_messages(request: &LlmRequest) -> Vec<Value> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = request.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            messages.push(json!({"role": "system", "content": sys}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));
        messages
    }

    fn build_body(request: &LlmRequest) -> Value {
        json!({
            "model": request.model,
            "messages": Self::build_messages(request),
            "temperature": request.config.temperature,
        })
    }

    fn build_http_request(&self, client: &Client, url: &str, body: &Value) -> reqwest::RequestBuilder {
        let mut req = client.post(url).bearer_auth(&self.api_key).json(body);
        if let Some(ref org) = self.organization {
            req = req.header("OpenAI-Organization", org.as_str());
        }
        req
    }

    fn extract_text(json_resp: &Value) -> Option<&str> {
        json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
    }

    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        for key in ["usage", "model", "id"] {
            if let Some(v) = json_resp.get(key) {
                meta.insert(key.into(), v.clone());
            }
        }
        if meta.is_empty() {
            None
        } else {
            Some(Value::Object(meta))
        }
    }
}

#[async_trait]
impl TextProvider for OpenAiProvider {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        let req = self.build_http_request(client, &url, &Self::build_body(request));

        let (json_resp, status) = send_json(self.name(), req).await?;
        let text = Self::extract_text(&json_resp)
            .ok_or_else(|| missing_text(self.name(), "choices[0].message.content"))?
            .to_string();

        Ok(LlmResponse {
            text,
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }
}
