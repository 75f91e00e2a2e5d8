//! Backend for Google's Generative Language API.
//!
//! Endpoint: `/v1beta/models/{model}:generateContent?key={key}`.
//! The key travels as a query parameter, not a header.

use super::{missing_text, redact_key, send_json, LlmRequest, LlmResponse, TextProvider};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for Gemini models.
#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &redact_key(&self.api_key))
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    fn endpoint(base_url: &str, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        )
    }

    /// Build the request body. Only the user prompt is sent.
    fn build_body(request: &LlmRequest) -> Value {
        json!({
            "contents": [{
                "parts": [{ "text": request.prompt }]
            }]
        })
    }

    fn extract_text(json_resp: &Value) -> Option<&str> {
        json_resp
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = Self::endpoint(base_url, &request.model);
        let req = client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::build_body(request));

        let (json_resp, status) = send_json(self.name(), req).await?;
        let text = Self::extract_text(&json_resp)
            .ok_or_else(|| missing_text(self.name(), "candidates[0].content.parts[0].text"))?
            .to_string();

        Ok(LlmResponse {
            text,
            status,
            metadata: json_resp.get("usageMetadata").cloned(),
        })
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LlmConfig;

    fn test_request() -> LlmRequest {
        LlmRequest {
            model: "gemini-2.0-flash-exp".into(),
            system_prompt: None,
            prompt: "Plan please".into(),
            config: LlmConfig::default(),
        }
    }

    #[test]
    fn test_gemini_body_shape() {
        let body = GeminiProvider::build_body(&test_request());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Plan please");
    }

    #[test]
    fn test_gemini_body_is_bare_prompt() {
        let mut request = test_request();
        request.system_prompt = Some("You are a coach.".into());
        let body = GeminiProvider::build_body(&request);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Plan please");
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
        assert!(body.get("system_instruction").is_none());
    }

    #[test]
    fn test_gemini_endpoint() {
        assert_eq!(
            GeminiProvider::endpoint("https://generativelanguage.googleapis.com/", "gemini-pro"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_gemini_extract_text() {
        let resp = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"workout\": \"x\"}"}]}}]
        });
        assert_eq!(GeminiProvider::extract_text(&resp), Some("{\"workout\": \"x\"}"));
        assert_eq!(GeminiProvider::extract_text(&json!({"candidates": []})), None);
    }

    #[test]
    fn test_gemini_key_in_query() {
        let provider = GeminiProvider::new("AIza-test");
        let client = Client::new();
        let req = client
            .post(GeminiProvider::endpoint("https://example.test", "m"))
            .query(&[("key", provider.api_key.as_str())])
            .build()
            .expect("build request");
        assert_eq!(req.url().query(), Some("key=AIza-test"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = GeminiProvider::new("AIzaSyD1234567890");
        let out = format!("{:?}", provider);
        assert!(!out.contains("1234567890"));
        assert!(out.contains("***"));
    }
}
