//! Text provider trait and normalized request/response types.
//!
//! The [`TextProvider`] trait abstracts over the upstream LLM APIs, translating
//! between the normalized [`LlmRequest`]/[`LlmResponse`] types and each
//! provider's HTTP shape. Every provider reduces its answer to one text blob.
//!
//! ## Architecture
//!
//! ```text
//! PlanRequest ──► prompt ──► LlmRequest ──► TextProvider::complete() ──► LlmResponse.text
//!                                                  │
//!                 ┌──────────────┬─────────────────┼──────────────┬─────────────┐
//!          GeminiProvider  HuggingFaceProvider  ClaudeProvider  OpenAiProvider  DemoProvider
//!          :generateContent  /models/{model}    /v1/messages   /v1/chat/...    (no network)
//! ```

pub mod claude;
pub mod demo;
pub mod gemini;
pub mod huggingface;
pub mod mock;
pub mod openai;

pub use claude::ClaudeProvider;
pub use demo::DemoProvider;
pub use gemini::GeminiProvider;
pub use huggingface::HuggingFaceProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use crate::error::Result;
use crate::PlanError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The upstream text-generation services the resolver can choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Gemini,
    HuggingFace,
    Claude,
    OpenAi,
}

impl ProviderKind {
    /// Priority order used when none is configured.
    pub const DEFAULT_ORDER: [ProviderKind; 4] = [
        ProviderKind::Gemini,
        ProviderKind::HuggingFace,
        ProviderKind::Claude,
        ProviderKind::OpenAi,
    ];

    /// Name used in user-facing error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::HuggingFace => "HuggingFace",
            ProviderKind::Claude => "Claude",
            ProviderKind::OpenAi => "OpenAI",
        }
    }

    /// Environment variable holding the credential.
    pub fn credential_env(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::HuggingFace => "HUGGINGFACE_API_KEY",
            ProviderKind::Claude => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// The sample-config value that means "not configured".
    pub fn placeholder(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "your_gemini_key_here",
            ProviderKind::HuggingFace => "your_huggingface_key_here",
            ProviderKind::Claude => "your_claude_key_here",
            ProviderKind::OpenAi => "your_openai_key_here",
        }
    }

    pub fn base_url_env(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_BASE_URL",
            ProviderKind::HuggingFace => "HUGGINGFACE_BASE_URL",
            ProviderKind::Claude => "ANTHROPIC_BASE_URL",
            ProviderKind::OpenAi => "OPENAI_BASE_URL",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::HuggingFace => "https://api-inference.huggingface.co",
            ProviderKind::Claude => "https://api.anthropic.com",
            ProviderKind::OpenAi => "https://api.openai.com",
        }
    }

    pub fn model_env(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_MODEL",
            ProviderKind::HuggingFace => "HUGGINGFACE_MODEL",
            ProviderKind::Claude => "ANTHROPIC_MODEL",
            ProviderKind::OpenAi => "OPENAI_MODEL",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.0-flash-exp",
            ProviderKind::HuggingFace => "mistralai/Mistral-7B-Instruct-v0.2",
            ProviderKind::Claude => "claude-3-5-sonnet-20241022",
            ProviderKind::OpenAi => "gpt-3.5-turbo",
        }
    }

    /// System message sent with the plan prompt. Only OpenAI takes one.
    pub fn system_prompt(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some(crate::prompt::COACH_PERSONA),
            _ => None,
        }
    }

    /// Generation parameters each provider is called with.
    pub fn generation_config(self) -> LlmConfig {
        match self {
            ProviderKind::HuggingFace => LlmConfig::default()
                .with_max_tokens(2000)
                .with_top_p(0.95),
            _ => LlmConfig::default(),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(PlanError::InvalidInput(format!("unknown provider '{}'", other))),
        }
    }
}

/// Generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Nucleus sampling cutoff, sent only by providers that accept it.
    pub top_p: Option<f64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
            top_p: None,
        }
    }
}

impl LlmConfig {
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// A normalized LLM request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier (e.g. `"gemini-2.0-flash-exp"`, `"gpt-3.5-turbo"`).
    pub model: String,

    /// Optional system prompt. Providers without a system slot ignore it.
    pub system_prompt: Option<String>,

    /// The user prompt text.
    pub prompt: String,

    pub config: LlmConfig,
}

/// A normalized LLM response.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token counts, model info), stored raw.
    pub metadata: Option<Value>,
}

/// Abstraction over text-generation providers.
///
/// Implementors translate between the normalized [`LlmRequest`]/[`LlmResponse`]
/// and the provider's HTTP API.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn TextProvider>`.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Execute one completion call.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse>;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> &'static str;
}

/// Send a request and decode a JSON body, mapping non-success statuses to
/// [`PlanError::ProviderHttp`] with the raw body kept for inspection.
pub(crate) async fn send_json(provider: &'static str, req: RequestBuilder) -> Result<(Value, u16)> {
    let resp = req.send().await?;
    let status = resp.status().as_u16();

    if !resp.status().is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(PlanError::ProviderHttp {
            provider,
            status,
            body,
        });
    }

    let json_resp: Value = resp.json().await?;
    Ok((json_resp, status))
}

/// Build a [`PlanError::MalformedResponse`] for a missing text path.
pub(crate) fn missing_text(provider: &'static str, path: &str) -> PlanError {
    PlanError::MalformedResponse {
        provider,
        detail: format!("missing {}", path),
    }
}

/// Mask an API key for `Debug` output, keeping a short prefix.
pub(crate) fn redact_key(key: &str) -> String {
    if key.len() > 6 && key.is_char_boundary(6) {
        format!("{}***", &key[..6])
    } else {
        "***".to_string()
    }
}
