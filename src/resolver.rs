//! Provider selection and the plan generation call.
//!
//! [`resolve_provider`] is a pure function of the configured credentials, so
//! each request picks its provider afresh. [`generate_plan`] makes exactly
//! one upstream call with the selected provider and hands the answer to the
//! extractor.

use crate::backend::demo::loading_plan;
use crate::backend::{
    ClaudeProvider, DemoProvider, GeminiProvider, HuggingFaceProvider, LlmConfig, LlmRequest,
    OpenAiProvider, ProviderKind, TextProvider,
};
use crate::config::{Config, Credentials};
use crate::error::{PlanError, Result, API_KEY_HELP_URL};
use crate::output_parser::{extract_plan, ExtractStage};
use crate::prompt::build_prompt;
use crate::types::{PlanRequest, PlanResult};
use reqwest::Client;
use tracing::{debug, error, info, warn};

/// The provider chosen for one request.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderChoice {
    Remote { kind: ProviderKind, api_key: String },
    Demo,
}

impl std::fmt::Debug for ProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderChoice::Remote { kind, .. } => {
                f.debug_struct("Remote").field("kind", kind).finish_non_exhaustive()
            }
            ProviderChoice::Demo => f.write_str("Demo"),
        }
    }
}

impl ProviderChoice {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderChoice::Remote { kind, .. } => kind.display_name(),
            ProviderChoice::Demo => "Demo",
        }
    }
}

/// A credential counts only when non-blank and not the sample placeholder.
pub fn usable_credential(credentials: &Credentials, kind: ProviderKind) -> Option<&str> {
    credentials
        .get(kind)
        .map(str::trim)
        .filter(|key| !key.is_empty() && *key != kind.placeholder())
}

/// Pick the first provider in `order` with a usable credential.
///
/// Falls back to [`ProviderChoice::Demo`] when `demo_mode` is set, and fails
/// with [`PlanError::NoProvider`] otherwise.
pub fn resolve_provider(
    credentials: &Credentials,
    order: &[ProviderKind],
    demo_mode: bool,
) -> Result<ProviderChoice> {
    for &kind in order {
        if let Some(key) = usable_credential(credentials, kind) {
            return Ok(ProviderChoice::Remote {
                kind,
                api_key: key.to_string(),
            });
        }
    }
    if demo_mode {
        return Ok(ProviderChoice::Demo);
    }
    Err(PlanError::NoProvider {
        help_url: API_KEY_HELP_URL,
    })
}

/// A generated plan and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPlan {
    pub plan: PlanResult,
    /// Display name of the provider that was called.
    pub provider: &'static str,
    pub stage: ExtractStage,
    /// The canned plan stood in for a provider that was still loading.
    pub substituted: bool,
}

/// Resolve, call and extract in one step.
pub async fn generate_plan(
    config: &Config,
    client: &Client,
    request: &PlanRequest,
) -> Result<GeneratedPlan> {
    let choice = resolve_provider(&config.credentials, &config.provider_order, config.demo_mode)?;
    info!(provider = choice.name(), "generating plan");

    let prompt = build_prompt(request, config.prompt_style);
    let (provider, base_url, llm_request): (Box<dyn TextProvider>, &str, LlmRequest) = match choice {
        ProviderChoice::Remote { kind, api_key } => (
            remote_provider(kind, api_key),
            config.provider(kind).base_url.as_str(),
            remote_request(config, kind, prompt),
        ),
        ProviderChoice::Demo => (
            Box::new(DemoProvider::new(request.clone())) as Box<dyn TextProvider>,
            "",
            LlmRequest {
                model: "demo".to_string(),
                system_prompt: None,
                prompt,
                config: LlmConfig::default(),
            },
        ),
    };

    run_provider(provider.as_ref(), client, base_url, &llm_request, request).await
}

/// The normalized plan request for one remote provider.
pub fn remote_request(config: &Config, kind: ProviderKind, prompt: String) -> LlmRequest {
    LlmRequest {
        model: config.provider(kind).model.clone(),
        system_prompt: kind.system_prompt().map(str::to_string),
        prompt,
        config: kind.generation_config(),
    }
}

/// Call one provider and extract its plan.
///
/// An error body mentioning `loading` (a cold-starting model) is answered
/// with the canned loading plan instead of an error.
pub async fn run_provider(
    provider: &dyn TextProvider,
    client: &Client,
    base_url: &str,
    llm_request: &LlmRequest,
    plan_request: &PlanRequest,
) -> Result<GeneratedPlan> {
    let name = provider.name();
    let (text, substituted) = match provider.complete(client, base_url, llm_request).await {
        Ok(response) => {
            debug!(
                provider = name,
                status = response.status,
                metadata = ?response.metadata,
                "provider answered"
            );
            (response.text, false)
        }
        Err(PlanError::ProviderHttp { status, body, .. }) if body.contains("loading") => {
            warn!(provider = name, status, "model is loading, substituting demo plan");
            (serde_json::to_string(&loading_plan(plan_request))?, true)
        }
        Err(err) => {
            error!(provider = name, error = %err, "provider call failed");
            return Err(err);
        }
    };

    let extraction = extract_plan(&text);
    info!(provider = name, stage = ?extraction.stage, "plan extracted");
    Ok(GeneratedPlan {
        plan: extraction.plan,
        provider: name,
        stage: extraction.stage,
        substituted,
    })
}

fn remote_provider(kind: ProviderKind, api_key: String) -> Box<dyn TextProvider> {
    match kind {
        ProviderKind::Gemini => Box::new(GeminiProvider::new(api_key)),
        ProviderKind::HuggingFace => Box::new(HuggingFaceProvider::new(api_key)),
        ProviderKind::Claude => Box::new(ClaudeProvider::new(api_key)),
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(api_key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockProvider, MockReply};
    use crate::backend::demo::demo_plan;
    use std::collections::HashMap;

    fn creds(pairs: &[(ProviderKind, &str)]) -> Credentials {
        pairs
            .iter()
            .fold(Credentials::default(), |c, (kind, key)| c.with(*kind, *key))
    }

    fn plan_request() -> PlanRequest {
        PlanRequest {
            name: "Lee".into(),
            diet: "vegan".into(),
            ..Default::default()
        }
    }

    fn llm_request() -> LlmRequest {
        LlmRequest {
            model: "test".into(),
            system_prompt: None,
            prompt: "plan".into(),
            config: LlmConfig::default(),
        }
    }

    #[test]
    fn test_priority_order() {
        let c = creds(&[
            (ProviderKind::OpenAi, "sk-1"),
            (ProviderKind::Claude, "sk-ant-1"),
        ]);
        let choice = resolve_provider(&c, &ProviderKind::DEFAULT_ORDER, false).unwrap();
        assert_eq!(
            choice,
            ProviderChoice::Remote {
                kind: ProviderKind::Claude,
                api_key: "sk-ant-1".into()
            }
        );
    }

    #[test]
    fn test_placeholder_is_absent() {
        let c = creds(&[
            (ProviderKind::Gemini, "your_gemini_key_here"),
            (ProviderKind::HuggingFace, "hf_real"),
        ]);
        let choice = resolve_provider(&c, &ProviderKind::DEFAULT_ORDER, false).unwrap();
        assert_eq!(choice.name(), "HuggingFace");
    }

    #[test]
    fn test_blank_is_absent() {
        let c = creds(&[(ProviderKind::Gemini, "   ")]);
        assert!(usable_credential(&c, ProviderKind::Gemini).is_none());
    }

    #[test]
    fn test_demo_when_nothing_configured() {
        let c = creds(&[(ProviderKind::OpenAi, "your_openai_key_here")]);
        let choice = resolve_provider(&c, &ProviderKind::DEFAULT_ORDER, true).unwrap();
        assert_eq!(choice, ProviderChoice::Demo);
    }

    #[test]
    fn test_real_key_beats_demo() {
        let c = creds(&[(ProviderKind::OpenAi, "sk-live")]);
        let choice = resolve_provider(&c, &ProviderKind::DEFAULT_ORDER, true).unwrap();
        assert_eq!(choice.name(), "OpenAI");
    }

    #[test]
    fn test_configuration_error_names_help_url() {
        let err = resolve_provider(&Credentials::default(), &ProviderKind::DEFAULT_ORDER, false)
            .unwrap_err();
        assert!(matches!(err, PlanError::NoProvider { .. }));
        assert!(err.to_string().contains("https://aistudio.google.com/apikey"));
    }

    #[test]
    fn test_custom_order() {
        let c = creds(&[
            (ProviderKind::Gemini, "g"),
            (ProviderKind::OpenAi, "o"),
        ]);
        let order = [ProviderKind::OpenAi, ProviderKind::Gemini];
        assert_eq!(resolve_provider(&c, &order, false).unwrap().name(), "OpenAI");
    }

    #[test]
    fn test_debug_hides_key() {
        let choice = ProviderChoice::Remote {
            kind: ProviderKind::Gemini,
            api_key: "AIza-secret".into(),
        };
        assert!(!format!("{:?}", choice).contains("secret"));
    }

    #[test]
    fn test_remote_request_persona_only_for_openai() {
        let config = Config::from_lookup(|_| None);
        let prompt = build_prompt(&plan_request(), config.prompt_style);

        for kind in [ProviderKind::Gemini, ProviderKind::HuggingFace, ProviderKind::Claude] {
            let req = remote_request(&config, kind, prompt.clone());
            assert!(req.system_prompt.is_none(), "{kind} got a system prompt");
            assert_eq!(req.prompt, prompt);
        }

        let openai = remote_request(&config, ProviderKind::OpenAi, prompt);
        assert_eq!(openai.system_prompt.as_deref(), Some(crate::prompt::COACH_PERSONA));
        assert_eq!(openai.model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_run_provider_extracts_plan() {
        let mock = MockProvider::fixed(
            "```json\n{\"workout\":\"Day 1\",\"diet\":\"Oats\",\"tips\":\"Sleep\",\"motivation\":\"Go\"}\n```",
        );
        let generated = run_provider(&mock, &Client::new(), "", &llm_request(), &plan_request())
            .await
            .unwrap();
        assert_eq!(generated.plan.diet, "Oats");
        assert_eq!(generated.stage, ExtractStage::Direct);
        assert_eq!(generated.provider, "Mock");
        assert!(!generated.substituted);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_loading_body_substitutes_plan() {
        let mock = MockProvider::failing(503, r#"{"error":"Model is currently loading"}"#);
        let generated = run_provider(&mock, &Client::new(), "", &llm_request(), &plan_request())
            .await
            .unwrap();
        assert!(generated.substituted);
        assert_eq!(generated.plan, loading_plan(&plan_request()));
    }

    #[tokio::test]
    async fn test_upstream_error_passes_through() {
        let mock = MockProvider::new(vec![MockReply::Http {
            status: 429,
            body: r#"{"error":{"message":"Quota exceeded"}}"#.into(),
        }]);
        let err = run_provider(&mock, &Client::new(), "", &llm_request(), &plan_request())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.to_string(), "Mock API Error: Quota exceeded");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_plan_demo_mode() {
        let env: HashMap<&str, &str> = [("DEMO_MODE", "true")].into_iter().collect();
        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        let generated = generate_plan(&config, &Client::new(), &plan_request())
            .await
            .unwrap();
        assert_eq!(generated.provider, "Demo");
        assert_eq!(generated.plan, demo_plan(&plan_request()));
    }

    #[tokio::test]
    async fn test_generate_plan_without_provider() {
        let config = Config::from_lookup(|_| None);
        let err = generate_plan(&config, &Client::new(), &plan_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::NoProvider { .. }));
    }
}
