//! HTTP surface.
//!
//! Every failure is answered as `{"error": message}` with a status code;
//! provider and media errors keep the upstream status.

use crate::bmi::{bmi_report, BmiInput, BmiReport};
use crate::config::Config;
use crate::error::PlanError;
use crate::media::{select_image_provider, ElevenLabsSpeech};
use crate::output_parser::{build_sections, PlanSections};
use crate::resolver::generate_plan;
use crate::store::{NewPlan, PlanArchive, PlanSlot, SavedPlan};
use crate::types::{PlanRequest, PlanResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    /// Map a service error, prefixing transport and unexpected failures with
    /// the endpoint's "unavailable" wording.
    fn with_prefix(err: PlanError, prefix: &str) -> Self {
        if err.is_unavailable() {
            return Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("{prefix}{err}"),
            };
        }
        err.into()
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State and request types
// ---------------------------------------------------------------------------

/// `Json` body extractor whose rejections are answered as `{"error": ...}`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Client,
    pub slot: Arc<PlanSlot>,
    pub archive: Option<PlanArchive>,
}

impl AppState {
    pub fn new(config: Config, client: Client, archive: Option<PlanArchive>) -> Self {
        let slot = Arc::new(PlanSlot::new(config.plan_slot.clone()));
        Self {
            config: Arc::new(config),
            client,
            slot,
            archive,
        }
    }

    fn archive(&self) -> Result<&PlanArchive, ApiError> {
        self.archive
            .as_ref()
            .ok_or_else(|| PlanError::StoreDisabled.into())
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate-plan", post(generate_plan_handler))
        .route("/api/generate-image", post(generate_image))
        .route("/api/text-to-speech", post(text_to_speech))
        .route("/api/plan-sections", post(plan_sections))
        .route("/api/bmi", post(bmi))
        .route("/api/plans/latest", get(latest_plan))
        .route("/api/plans", get(list_saved_plans).post(save_plan))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_server(state: AppState, bind: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("fitplan listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("fitplan shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn generate_plan_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PlanRequest>,
) -> Result<Json<PlanResult>, ApiError> {
    let generated = generate_plan(&state.config, &state.client, &request)
        .await
        .map_err(|e| ApiError::with_prefix(e, "Failed to generate plan: "))?;

    if let Err(err) = state.slot.save(&generated.plan).await {
        warn!(error = %err, "could not store latest plan");
    }
    Ok(Json(generated.plan))
}

async fn generate_image(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ImageRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    const PREFIX: &str = "Image generation unavailable: ";
    if request.prompt.trim().is_empty() {
        return Err(PlanError::InvalidInput("prompt is required".to_string()).into());
    }
    let provider = select_image_provider(&state.config)?;
    info!(provider = provider.name(), "generating image");
    let image_url = provider
        .generate(&state.client, request.prompt.trim())
        .await
        .map_err(|e| ApiError::with_prefix(e, PREFIX))?;
    Ok(Json(ImageResponse { image_url }))
}

async fn text_to_speech(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SpeechRequest>,
) -> Result<Response, ApiError> {
    if request.text.trim().is_empty() {
        return Err(PlanError::InvalidInput("text is required".to_string()).into());
    }
    let speech = ElevenLabsSpeech::from_config(&state.config)?;
    let audio = speech
        .synthesize(&state.client, &request.text)
        .await
        .map_err(|e| ApiError::with_prefix(e, "Text-to-speech unavailable: "))?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

async fn plan_sections(ApiJson(plan): ApiJson<PlanResult>) -> Json<PlanSections> {
    Json(build_sections(&plan))
}

async fn bmi(ApiJson(input): ApiJson<BmiInput>) -> Result<Json<BmiReport>, ApiError> {
    Ok(Json(bmi_report(input)?))
}

async fn latest_plan(State(state): State<AppState>) -> Result<Json<PlanResult>, ApiError> {
    state
        .slot
        .load()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No plan has been generated yet"))
}

async fn list_saved_plans(
    State(state): State<AppState>,
) -> Result<Json<Vec<SavedPlan>>, ApiError> {
    Ok(Json(state.archive()?.recent().await?))
}

async fn save_plan(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewPlan>,
) -> Result<(StatusCode, Json<SavedPlan>), ApiError> {
    let saved = state.archive()?.save(new).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn state_with(pairs: &[(&str, &str)], dir: &tempfile::TempDir) -> AppState {
        let slot = dir.path().join("fitness_plan.json");
        let mut env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env.insert("FITPLAN_PLAN_SLOT".into(), slot.display().to_string());
        let config = Config::from_lookup(|k| env.get(k).cloned());
        AppState::new(config, Client::new(), None)
    }

    async fn send(state: AppState, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        build_router(state).oneshot(request).await.unwrap()
    }

    async fn send_raw(state: AppState, uri: &str, body: &'static str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        build_router(state).oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn form() -> Value {
        json!({
            "name": "Ravi", "age": "34", "gender": "male", "height": "178",
            "weight": "80", "goal": "muscle_gain", "fitnessLevel": "intermediate",
            "location": "gym", "diet": "non-vegetarian", "stressLevel": "low"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send(state_with(&[], &dir), "GET", "/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_generate_plan_demo_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&[("DEMO_MODE", "true")], &dir);

        let resp = send(state.clone(), "POST", "/api/generate-plan", Some(form())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let plan = body_json(resp).await;
        for field in ["workout", "diet", "tips", "motivation"] {
            assert!(!plan[field].as_str().unwrap().is_empty(), "{field} empty");
        }
        assert!(plan["workout"].as_str().unwrap().contains("RAVI"));

        let latest = send(state, "GET", "/api/plans/latest", None).await;
        assert_eq!(latest.status(), StatusCode::OK);
        assert_eq!(body_json(latest).await, plan);
    }

    #[tokio::test]
    async fn test_generate_plan_without_provider() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&[("GEMINI_API_KEY", "your_gemini_key_here")], &dir);
        let resp = send(state, "POST", "/api/generate-plan", Some(form())).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("https://aistudio.google.com/apikey"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send_raw(state_with(&[], &dir), "/api/generate-plan", "not json").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("application/json"), "got {content_type}");
        let body = body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn test_incomplete_body_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send_raw(state_with(&[], &dir), "/api/plan-sections", r#"{"workout":"x"}"#).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("diet"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/api/bmi")
            .body(Body::from(r#"{"weight":70,"height":175}"#))
            .unwrap();
        let resp = build_router(state_with(&[], &dir)).oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_bmi_accepts_form_strings() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send_raw(
            state_with(&[], &dir),
            "/api/bmi",
            r#"{"weight":"95","height":"170"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "bmi": 32.9, "category": "Obese" }));
    }

    #[tokio::test]
    async fn test_latest_is_404_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send(state_with(&[], &dir), "GET", "/api/plans/latest", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_speech_without_key() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send(
            state_with(&[], &dir),
            "POST",
            "/api/text-to-speech",
            Some(json!({ "text": "Day 1" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await["error"],
            crate::media::speech::SPEECH_NOT_CONFIGURED
        );
    }

    #[tokio::test]
    async fn test_speech_requires_text() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send(
            state_with(&[("ELEVENLABS_API_KEY", "el-live")], &dir),
            "POST",
            "/api/text-to-speech",
            Some(json!({ "text": "  " })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_image_without_key() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send(
            state_with(&[], &dir),
            "POST",
            "/api/generate-image",
            Some(json!({ "prompt": "squats" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await["error"],
            "OpenAI API key not configured"
        );
    }

    #[tokio::test]
    async fn test_bmi() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&[], &dir);
        let resp = send(
            state.clone(),
            "POST",
            "/api/bmi",
            Some(json!({ "weight": 70, "height": 175 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({ "bmi": 22.9, "category": "Normal" })
        );

        let bad = send(
            state,
            "POST",
            "/api/bmi",
            Some(json!({ "weight": 70, "height": 0 })),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plan_sections() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send(
            state_with(&[], &dir),
            "POST",
            "/api/plan-sections",
            Some(json!({
                "workout": "DAY 1 - LEGS\n• Squats: 3x12\n• Lunges: 3x10\nDAY 2 - REST",
                "diet": "Eat well",
                "tips": "Sleep early",
                "motivation": "**Go**"
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["workout"]["layout"], "grouped");
        assert_eq!(body["workout"]["entries"][0]["title"], "DAY 1 - LEGS");
        assert_eq!(
            body["workout"]["entries"][0]["exercises"],
            json!(["Squats: 3x12", "Lunges: 3x10"])
        );
        assert_eq!(body["diet"]["layout"], "ungrouped");
        assert_eq!(body["diet"]["entries"], json!(["Eat well"]));
        assert_eq!(body["motivation"], "Go");
    }

    #[tokio::test]
    async fn test_saved_plans_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let resp = send(state_with(&[], &dir), "GET", "/api/plans", None).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(resp).await["error"],
            "Plan storage is not configured"
        );
    }

    #[tokio::test]
    async fn test_saved_plans_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with(&[], &dir);
        state.archive = Some(PlanArchive::connect("sqlite::memory:").await.unwrap());

        let created = send(
            state.clone(),
            "POST",
            "/api/plans",
            Some(json!({
                "name": "Ravi",
                "goal": "muscle_gain",
                "plan": { "workout": "w", "diet": "d", "tips": "t", "motivation": "m" }
            })),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let saved = body_json(created).await;
        assert_eq!(saved["name"], "Ravi");
        assert!(saved["createdAt"].is_string());

        let listed = send(state, "GET", "/api/plans", None).await;
        let rows = body_json(listed).await;
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["plan"]["tips"], "t");
    }
}
