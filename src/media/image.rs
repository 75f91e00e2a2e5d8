//! Image generation.
//!
//! Two providers: OpenAI's synchronous images endpoint, and Replicate, whose
//! predictions may finish asynchronously and are then polled at a fixed
//! interval up to a fixed number of status checks.

use crate::config::Config;
use crate::error::{PlanError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

const IMAGE_PROMPT_PREFIX: &str = "Realistic fitness image: ";
const IMAGE_FAILED: &str = "Image generation failed";
pub const IMAGE_NOT_CONFIGURED: &str = "OpenAI API key not configured";

/// Interval and cap for asynchronous job polling.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Wait before each status check.
    pub interval: Duration,
    /// Status checks before giving up.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1500),
            max_attempts: 20,
        }
    }
}

impl PollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

/// A service that turns a prompt into a hosted image URL.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, client: &Client, prompt: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Pick the image provider for this configuration: Replicate when its token
/// is set, otherwise OpenAI.
pub fn select_image_provider(config: &Config) -> Result<Box<dyn ImageProvider>> {
    let media = &config.media;
    if let Some(token) = media.replicate_token.as_deref() {
        return Ok(Box::new(ReplicateImages {
            token: token.to_string(),
            model: media.replicate_model.clone(),
            base_url: media.replicate_base_url.clone(),
            poll: media.image_poll.clone(),
        }));
    }
    if let Some(key) = config.openai_key() {
        return Ok(Box::new(OpenAiImages::new(
            key,
            config.provider(crate::backend::ProviderKind::OpenAi).base_url.clone(),
        )));
    }
    Err(PlanError::NotConfigured(IMAGE_NOT_CONFIGURED.to_string()))
}

/// DALL-E 3 through `/v1/images/generations`.
pub struct OpenAiImages {
    api_key: String,
    base_url: String,
}

impl OpenAiImages {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn build_body(prompt: &str) -> Value {
        json!({
            "model": "dall-e-3",
            "prompt": format!("{}{}", IMAGE_PROMPT_PREFIX, prompt),
            "n": 1,
            "size": "1024x1024",
        })
    }
}

#[async_trait]
impl ImageProvider for OpenAiImages {
    async fn generate(&self, client: &Client, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/images/generations", self.base_url.trim_end_matches('/'));
        let req = client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&Self::build_body(prompt));
        let body = send_image_request(req).await?;

        body.pointer("/data/0/url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PlanError::MalformedResponse {
                provider: self.name(),
                detail: "missing data[0].url".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }
}

/// Replicate model predictions, polled until they settle.
pub struct ReplicateImages {
    token: String,
    model: String,
    base_url: String,
    poll: PollConfig,
}

impl ReplicateImages {
    fn build_body(prompt: &str) -> Value {
        json!({
            "input": { "prompt": format!("{}{}", IMAGE_PROMPT_PREFIX, prompt) }
        })
    }
}

#[async_trait]
impl ImageProvider for ReplicateImages {
    async fn generate(&self, client: &Client, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1/models/{}/predictions",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let req = client
            .post(url)
            .bearer_auth(&self.token)
            .json(&Self::build_body(prompt));
        let prediction = send_image_request(req).await?;

        if let Some(url) = output_url(&prediction) {
            return Ok(url);
        }

        let status_url = prediction
            .pointer("/urls/get")
            .and_then(Value::as_str)
            .ok_or_else(|| PlanError::MalformedResponse {
                provider: self.name(),
                detail: "missing urls.get".to_string(),
            })?
            .to_string();
        info!(status_url = %status_url, "image prediction pending, polling");

        poll_prediction(&self.poll, || {
            send_image_request(client.get(&status_url).bearer_auth(&self.token))
        })
        .await
    }

    fn name(&self) -> &'static str {
        "Replicate"
    }
}

/// Poll a prediction until it settles.
///
/// Waits `interval` before each call to `fetch`, for at most `max_attempts`
/// calls. `succeeded` yields the output URL; `failed` or `canceled` stops
/// immediately.
pub async fn poll_prediction<F, Fut>(config: &PollConfig, mut fetch: F) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;
        let prediction = fetch().await?;
        let status = prediction
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        debug!(attempt, status, "image prediction status");

        match status {
            "succeeded" => {
                return output_url(&prediction).ok_or_else(|| PlanError::MalformedResponse {
                    provider: "Replicate",
                    detail: "succeeded without output".to_string(),
                });
            }
            "failed" | "canceled" => {
                warn!(attempt, status, "image prediction ended without output");
                return Err(PlanError::JobFailed {
                    status: status.to_string(),
                });
            }
            _ => {}
        }
    }

    Err(PlanError::PollExhausted {
        attempts: config.max_attempts,
    })
}

/// `output` as a URL string, or the first element of an output array.
fn output_url(prediction: &Value) -> Option<String> {
    match prediction.get("output")? {
        Value::String(url) => Some(url.clone()),
        Value::Array(items) => items.first()?.as_str().map(str::to_string),
        _ => None,
    }
}

async fn send_image_request(req: RequestBuilder) -> Result<Value> {
    let resp = req.send().await?;
    let status = resp.status().as_u16();
    if !resp.status().is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(status, body = %body, "image provider returned an error");
        return Err(PlanError::Upstream {
            status,
            message: IMAGE_FAILED.to_string(),
        });
    }
    Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast() -> PollConfig {
        PollConfig::default().with_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_poll_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_millis(1500));
        assert_eq!(config.max_attempts, 20);
    }

    #[tokio::test]
    async fn test_failed_on_third_poll_stops_early() {
        let calls = AtomicUsize::new(0);
        let result = poll_prediction(&fast(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                let status = if n == 3 { "failed" } else { "processing" };
                Ok(json!({ "status": status }))
            }
        })
        .await;

        assert!(matches!(result, Err(PlanError::JobFailed { ref status }) if status == "failed"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_succeeded_returns_first_output() {
        let calls = AtomicUsize::new(0);
        let url = poll_prediction(&fast(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(if n == 0 {
                    json!({ "status": "starting" })
                } else {
                    json!({ "status": "succeeded", "output": ["https://img.test/a.png", "https://img.test/b.png"] })
                })
            }
        })
        .await
        .unwrap();
        assert_eq!(url, "https://img.test/a.png");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cap_exhaustion() {
        let calls = AtomicUsize::new(0);
        let config = fast().with_max_attempts(4);
        let result = poll_prediction(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(json!({ "status": "processing" })) }
        })
        .await;
        assert!(matches!(result, Err(PlanError::PollExhausted { attempts: 4 })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_canceled_is_terminal() {
        let result = poll_prediction(&fast(), || async { Ok(json!({ "status": "canceled" })) }).await;
        assert!(matches!(result, Err(PlanError::JobFailed { .. })));
    }

    #[test]
    fn test_output_url_shapes() {
        assert_eq!(output_url(&json!({"output": "u"})), Some("u".into()));
        assert_eq!(output_url(&json!({"output": ["v"]})), Some("v".into()));
        assert_eq!(output_url(&json!({"output": null})), None);
        assert_eq!(output_url(&json!({})), None);
    }

    #[test]
    fn test_openai_image_body() {
        let body = OpenAiImages::build_body("woman deadlifting");
        assert_eq!(body["model"], "dall-e-3");
        assert_eq!(body["prompt"], "Realistic fitness image: woman deadlifting");
        assert_eq!(body["n"], 1);
        assert_eq!(body["size"], "1024x1024");
    }

    #[test]
    fn test_replicate_body() {
        let body = ReplicateImages::build_body("rowing");
        assert_eq!(body["input"]["prompt"], "Realistic fitness image: rowing");
    }

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<&str, &str> = pairs.iter().copied().collect();
        Config::from_lookup(|k| env.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn test_selection() {
        let none = config_from(&[("OPENAI_API_KEY", "your_openai_key_here")]);
        let err = select_image_provider(&none).err().unwrap();
        assert_eq!(err.to_string(), "OpenAI API key not configured");

        let openai = config_from(&[("OPENAI_API_KEY", "sk-live")]);
        assert_eq!(select_image_provider(&openai).unwrap().name(), "OpenAI");

        let both = config_from(&[("OPENAI_API_KEY", "sk-live"), ("REPLICATE_API_TOKEN", "r8_x")]);
        assert_eq!(select_image_provider(&both).unwrap().name(), "Replicate");
    }
}
