//! Plan narration through ElevenLabs text-to-speech.

use crate::config::Config;
use crate::error::{PlanError, Result};
use bytes::Bytes;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Characters sent per request; longer plans are cut.
pub const MAX_SPEECH_CHARS: usize = 2500;
const SPEECH_MODEL: &str = "eleven_turbo_v2_5";
pub const SPEECH_NOT_CONFIGURED: &str =
    "ElevenLabs API key not configured. Please add ELEVENLABS_API_KEY to .env.local";
const SPEECH_FAILED: &str = "Text-to-speech API failed. Check your API key.";

#[derive(Clone)]
pub struct ElevenLabsSpeech {
    api_key: String,
    voice_id: String,
    base_url: String,
}

impl std::fmt::Debug for ElevenLabsSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsSpeech")
            .field("api_key", &"***")
            .field("voice_id", &self.voice_id)
            .finish()
    }
}

impl ElevenLabsSpeech {
    pub fn new(
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            base_url: base_url.into(),
        }
    }

    /// Build the client from configuration, failing when no key is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let key = config
            .elevenlabs_key()
            .ok_or_else(|| PlanError::NotConfigured(SPEECH_NOT_CONFIGURED.to_string()))?;
        Ok(Self::new(
            key,
            config.media.elevenlabs_voice.clone(),
            config.media.elevenlabs_base_url.clone(),
        ))
    }

    fn build_body(text: &str) -> Value {
        json!({
            "text": truncate_chars(text, MAX_SPEECH_CHARS),
            "model_id": SPEECH_MODEL,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
            }
        })
    }

    fn build_http_request(&self, client: &Client, text: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.base_url.trim_end_matches('/'),
            self.voice_id
        );
        client
            .post(url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.api_key)
            .json(&Self::build_body(text))
    }

    /// Synthesize `text` into MP3 bytes.
    pub async fn synthesize(&self, client: &Client, text: &str) -> Result<Bytes> {
        let resp = self.build_http_request(client, text).send().await?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status, body = %body, "text-to-speech request failed");
            return Err(PlanError::Upstream {
                status,
                message: SPEECH_FAILED.to_string(),
            });
        }
        let audio = resp.bytes().await?;
        info!(bytes = audio.len(), "speech synthesized");
        Ok(audio)
    }
}

/// The first `max` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
