//! Environment-only configuration.
//!
//! Every setting is read from an environment variable with a fallback
//! default. [`Config::from_lookup`] takes the lookup as a closure so tests can
//! build configurations without touching the process environment.

use crate::backend::ProviderKind;
use crate::media::image::PollConfig;
use crate::prompt::PromptStyle;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEMO_MODE_ENV: &str = "DEMO_MODE";
pub const PROVIDER_ORDER_ENV: &str = "FITPLAN_PROVIDER_ORDER";
pub const PROMPT_STYLE_ENV: &str = "FITPLAN_PROMPT_STYLE";
pub const HTTP_TIMEOUT_ENV: &str = "FITPLAN_HTTP_TIMEOUT_SECS";
pub const PLAN_SLOT_ENV: &str = "FITPLAN_PLAN_SLOT";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const REPLICATE_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";
pub const REPLICATE_MODEL_ENV: &str = "REPLICATE_MODEL";
pub const REPLICATE_BASE_URL_ENV: &str = "REPLICATE_BASE_URL";
pub const ELEVENLABS_KEY_ENV: &str = "ELEVENLABS_API_KEY";
pub const ELEVENLABS_VOICE_ENV: &str = "ELEVENLABS_VOICE_ID";
pub const ELEVENLABS_BASE_URL_ENV: &str = "ELEVENLABS_BASE_URL";

/// Placeholder shipped in the sample `.env` for the speech credential.
pub const ELEVENLABS_PLACEHOLDER: &str = "your_elevenlabs_key_here";

const DEFAULT_REPLICATE_MODEL: &str = "black-forest-labs/flux-schnell";
const DEFAULT_REPLICATE_BASE_URL: &str = "https://api.replicate.com";
const DEFAULT_ELEVENLABS_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";
const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_PLAN_SLOT: &str = "fitness_plan.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Raw credential values per text provider, exactly as configured.
///
/// Placeholder detection happens in the resolver, not here.
#[derive(Clone, Default)]
pub struct Credentials {
    pub gemini: Option<String>,
    pub huggingface: Option<String>,
    pub anthropic: Option<String>,
    pub openai: Option<String>,
}

impl Credentials {
    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gemini => self.gemini.as_deref(),
            ProviderKind::HuggingFace => self.huggingface.as_deref(),
            ProviderKind::Claude => self.anthropic.as_deref(),
            ProviderKind::OpenAi => self.openai.as_deref(),
        }
    }

    /// Set the credential for one provider.
    pub fn with(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        let slot = match kind {
            ProviderKind::Gemini => &mut self.gemini,
            ProviderKind::HuggingFace => &mut self.huggingface,
            ProviderKind::Claude => &mut self.anthropic,
            ProviderKind::OpenAi => &mut self.openai,
        };
        *slot = Some(key.into());
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("gemini", &mask(&self.gemini))
            .field("huggingface", &mask(&self.huggingface))
            .field("anthropic", &mask(&self.anthropic))
            .field("openai", &mask(&self.openai))
            .finish()
    }
}

/// Endpoint and model for one text provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub model: String,
}

/// Image and speech settings.
#[derive(Clone)]
pub struct MediaConfig {
    pub replicate_token: Option<String>,
    pub replicate_model: String,
    pub replicate_base_url: String,
    pub image_poll: PollConfig,
    pub elevenlabs_key: Option<String>,
    pub elevenlabs_voice: String,
    pub elevenlabs_base_url: String,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("has_replicate_token", &self.replicate_token.is_some())
            .field("replicate_model", &self.replicate_model)
            .field("image_poll", &self.image_poll)
            .field("has_elevenlabs_key", &self.elevenlabs_key.is_some())
            .field("elevenlabs_voice", &self.elevenlabs_voice)
            .finish()
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Priority order used by the provider resolver.
    pub provider_order: Vec<ProviderKind>,
    /// Return canned content when no credential is usable.
    pub demo_mode: bool,
    pub prompt_style: PromptStyle,
    gemini: ProviderSettings,
    huggingface: ProviderSettings,
    claude: ProviderSettings,
    openai: ProviderSettings,
    pub media: MediaConfig,
    pub http_timeout: Duration,
    /// File holding the most recent plan.
    pub plan_slot: PathBuf,
    /// Optional sqlite URL for the saved-plan table.
    pub database_url: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let settings = |kind: ProviderKind| ProviderSettings {
            base_url: or(kind.base_url_env(), kind.default_base_url()),
            model: or(kind.model_env(), kind.default_model()),
        };

        let credentials = Credentials {
            gemini: get(ProviderKind::Gemini.credential_env()),
            huggingface: get(ProviderKind::HuggingFace.credential_env()),
            anthropic: get(ProviderKind::Claude.credential_env()),
            openai: get(ProviderKind::OpenAi.credential_env()),
        };

        let provider_order = get(PROVIDER_ORDER_ENV)
            .map(|raw| parse_provider_order(&raw))
            .filter(|order| !order.is_empty())
            .unwrap_or_else(|| ProviderKind::DEFAULT_ORDER.to_vec());

        let prompt_style = match get(PROMPT_STYLE_ENV).as_deref() {
            None => PromptStyle::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = raw, "unknown prompt style, using strict");
                PromptStyle::default()
            }),
        };

        let http_timeout = get(HTTP_TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            credentials,
            provider_order,
            demo_mode: get(DEMO_MODE_ENV).is_some_and(|v| v.trim() == "true"),
            prompt_style,
            gemini: settings(ProviderKind::Gemini),
            huggingface: settings(ProviderKind::HuggingFace),
            claude: settings(ProviderKind::Claude),
            openai: settings(ProviderKind::OpenAi),
            media: MediaConfig {
                replicate_token: get(REPLICATE_TOKEN_ENV),
                replicate_model: or(REPLICATE_MODEL_ENV, DEFAULT_REPLICATE_MODEL),
                replicate_base_url: or(REPLICATE_BASE_URL_ENV, DEFAULT_REPLICATE_BASE_URL),
                image_poll: PollConfig::default(),
                elevenlabs_key: get(ELEVENLABS_KEY_ENV),
                elevenlabs_voice: or(ELEVENLABS_VOICE_ENV, DEFAULT_ELEVENLABS_VOICE),
                elevenlabs_base_url: or(ELEVENLABS_BASE_URL_ENV, DEFAULT_ELEVENLABS_BASE_URL),
            },
            http_timeout: Duration::from_secs(http_timeout),
            plan_slot: PathBuf::from(or(PLAN_SLOT_ENV, DEFAULT_PLAN_SLOT)),
            database_url: get(DATABASE_URL_ENV),
        }
    }

    /// Endpoint and model for a text provider.
    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::HuggingFace => &self.huggingface,
            ProviderKind::Claude => &self.claude,
            ProviderKind::OpenAi => &self.openai,
        }
    }

    /// The image credential shared with the OpenAI text provider.
    pub fn openai_key(&self) -> Option<&str> {
        self.credentials
            .openai
            .as_deref()
            .filter(|k| *k != ProviderKind::OpenAi.placeholder())
    }

    /// The speech credential, if set and not the sample placeholder.
    pub fn elevenlabs_key(&self) -> Option<&str> {
        self.media
            .elevenlabs_key
            .as_deref()
            .filter(|k| *k != ELEVENLABS_PLACEHOLDER)
    }
}

/// Parse a comma-separated provider list, skipping unknown and repeated names.
pub fn parse_provider_order(raw: &str) -> Vec<ProviderKind> {
    let mut order = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name.parse::<ProviderKind>() {
            Ok(kind) if !order.contains(&kind) => order.push(kind),
            Ok(_) => {}
            Err(_) => warn!(provider = name, "ignoring unknown provider in priority list"),
        }
    }
    order
}
