use thiserror::Error;

/// Documentation link surfaced when no text provider is usable.
pub const API_KEY_HELP_URL: &str = "https://aistudio.google.com/apikey";

/// Errors produced by the plan service and its components.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON (de)serialization failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// No provider credential is usable and demo mode is off.
    #[error("No AI API key configured. Get a free Gemini key from {help_url}")]
    NoProvider {
        /// Where to obtain a free credential.
        help_url: &'static str,
    },

    /// A media service is missing its credential.
    #[error("{0}")]
    NotConfigured(String),

    /// A text provider returned a non-success status code.
    ///
    /// `body` is kept verbatim so the resolver can inspect it (the
    /// HuggingFace cold-start `loading` case).
    #[error("{provider} API Error: {}", upstream_message(.body))]
    ProviderHttp {
        /// Display name of the provider (e.g. `"Gemini"`).
        provider: &'static str,
        /// HTTP status code returned by the provider.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// A media service failed with a fixed user-facing message.
    #[error("{message}")]
    Upstream {
        /// Status passed through to the caller.
        status: u16,
        /// User-facing message.
        message: String,
    },

    /// A provider answered 2xx but the expected field was absent.
    #[error("{provider} returned an unexpected response: {detail}")]
    MalformedResponse {
        provider: &'static str,
        detail: String,
    },

    /// An asynchronous image job reached a terminal non-success status.
    #[error("Image generation {status}")]
    JobFailed {
        /// Terminal status reported by the provider (`failed`, `canceled`).
        status: String,
    },

    /// An asynchronous image job did not finish within the attempt cap.
    #[error("Image generation timed out after {attempts} status checks")]
    PollExhausted { attempts: u32 },

    /// The saved-plan table is not configured.
    #[error("Plan storage is not configured")]
    StoreDisabled,

    /// Database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure (local plan slot).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request body was well-formed JSON but semantically invalid.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl PlanError {
    /// HTTP status this error maps to at the service boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            PlanError::ProviderHttp { status, .. } | PlanError::Upstream { status, .. } => *status,
            PlanError::MalformedResponse { .. }
            | PlanError::JobFailed { .. }
            | PlanError::PollExhausted { .. } => 502,
            PlanError::StoreDisabled => 503,
            PlanError::InvalidInput(_) => 400,
            _ => 500,
        }
    }

    /// Whether this is a transport or unexpected failure that callers should
    /// report as "unavailable" rather than pass through.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            PlanError::Request(_)
                | PlanError::Json(_)
                | PlanError::Database(_)
                | PlanError::Io(_)
                | PlanError::Other(_)
        )
    }
}

impl From<anyhow::Error> for PlanError {
    fn from(err: anyhow::Error) -> Self {
        PlanError::Other(err.to_string())
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// Providers answer with `{"error": {"message": ...}}` (Gemini, Claude,
/// OpenAI), `{"error": "..."}` (HuggingFace), or plain text.
pub fn upstream_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => {
            let error = value.get("error");
            error
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .or_else(|| error.and_then(|e| e.as_str()))
                .unwrap_or("Unknown error")
                .to_string()
        }
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => "Unknown error".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_nested_error() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        assert_eq!(upstream_message(body), "API key not valid");
    }

    #[test]
    fn test_upstream_message_string_error() {
        let body = r#"{"error": "Model mistralai/Mistral-7B is currently loading"}"#;
        assert_eq!(
            upstream_message(body),
            "Model mistralai/Mistral-7B is currently loading"
        );
    }

    #[test]
    fn test_upstream_message_plain_text_and_empty() {
        assert_eq!(upstream_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(upstream_message(""), "Unknown error");
        assert_eq!(upstream_message("{}"), "Unknown error");
    }

    #[test]
    fn test_provider_http_display_and_status() {
        let err = PlanError::ProviderHttp {
            provider: "Gemini",
            status: 403,
            body: r#"{"error": {"message": "denied"}}"#.into(),
        };
        assert_eq!(err.to_string(), "Gemini API Error: denied");
        assert_eq!(err.status_code(), 403);
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_no_provider_names_help_url() {
        let err = PlanError::NoProvider {
            help_url: API_KEY_HELP_URL,
        };
        assert!(err.to_string().contains(API_KEY_HELP_URL));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(PlanError::StoreDisabled.status_code(), 503);
        assert_eq!(PlanError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(PlanError::PollExhausted { attempts: 20 }.status_code(), 502);
        assert!(PlanError::Other("boom".into()).is_unavailable());
    }
}
