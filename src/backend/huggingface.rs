//! Backend for the HuggingFace Inference API.
//!
//! Endpoint: `/models/{model}` with bearer auth. Answers are either
//! `[{"generated_text": ...}]` or `{"generated_text": ...}` depending on the
//! model's pipeline. A cold model answers 503 with a body mentioning
//! `loading`; the resolver handles that case.

use super::{missing_text, redact_key, send_json, LlmRequest, LlmResponse, TextProvider};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct HuggingFaceProvider {
    api_key: String,
}

impl std::fmt::Debug for HuggingFaceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceProvider")
            .field("api_key", &redact_key(&self.api_key))
            .finish()
    }
}

impl HuggingFaceProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    fn build_body(request: &LlmRequest) -> Value {
        let mut parameters = json!({
            "max_new_tokens": request.config.max_tokens,
            "temperature": request.config.temperature,
            "return_full_text": false,
        });
        if let Some(top_p) = request.config.top_p {
            parameters["top_p"] = json!(top_p);
        }
        json!({
            "inputs": request.prompt,
            "parameters": parameters,
        })
    }

    fn extract_text(json_resp: &Value) -> Option<&str> {
        let entry = match json_resp {
            Value::Array(items) => items.first()?,
            other => other,
        };
        entry.get("generated_text").and_then(|t| t.as_str())
    }
}

#[async_trait]
impl TextProvider for HuggingFaceProvider {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/models/{}", base_url.trim_end_matches('/'), request.model);
        let req = client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&Self::build_body(request));

        let (json_resp, status) = send_json(self.name(), req).await?;
        let text = Self::extract_text(&json_resp)
            .ok_or_else(|| missing_text(self.name(), "generated_text"))?
            .to_string();

        Ok(LlmResponse {
            text,
            status,
            metadata: None,
        })
    }

    fn name(&self) -> &'static str {
        "HuggingFace"
    }
}
