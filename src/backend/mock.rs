//! Mock provider for testing without a live LLM.
//!
//! [`MockProvider`] returns pre-configured replies in order and records the
//! prompts it was given, so the resolver can be tested end to end.
//!
//! # Example
//!
//! ```
//! use fitplan::backend::MockProvider;
//!
//! let mock = MockProvider::fixed(r#"{"workout": "Day 1: Squats"}"#);
//! let cold = MockProvider::failing(503, "Model is currently loading");
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;

use super::{LlmRequest, LlmResponse, TextProvider};
use crate::error::Result;
use crate::PlanError;

/// One canned outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Fails the way a real provider does on a non-success status.
    Http { status: u16, body: String },
}

/// A test provider that returns canned replies in order.
///
/// Cycles back to the beginning when all replies have been consumed.
#[derive(Debug)]
pub struct MockProvider {
    replies: Vec<MockReply>,
    index: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a mock provider with the given canned replies.
    pub fn new(replies: Vec<MockReply>) -> Self {
        assert!(!replies.is_empty(), "MockProvider requires at least one reply");
        Self {
            replies,
            index: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![MockReply::Text(response.into())])
    }

    /// Create a mock that always fails with the given status and body.
    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self::new(vec![MockReply::Http {
            status,
            body: body.into(),
        }])
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    /// Prompts received, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self) -> MockReply {
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.replies.len();
        self.replies[idx].clone()
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }
        match self.next_reply() {
            MockReply::Text(text) => Ok(LlmResponse {
                text,
                status: 200,
                metadata: None,
            }),
            MockReply::Http { status, body } => Err(PlanError::ProviderHttp {
                provider: self.name(),
                status,
                body,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}
