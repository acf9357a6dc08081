use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{error, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::content::StudySource;
use crate::error::{AiError, ContentError, ServerError, SettingsError, TranscriptError};
use crate::model::{ChatMessage, Difficulty, QuizOptions};
use crate::providers::{build_client, ProviderFactory};
use crate::settings::{AiSettings, SettingsOverride, SettingsStore};
use crate::tools::StudyAssistant;
use crate::transcript::TranscriptService;

/// Shared state behind every route
pub struct AppState {
    config: AppConfig,
    store: SettingsStore,
    settings: RwLock<AiSettings>,
    transcripts: TranscriptService,
    client: Client,
}

impl AppState {
    pub fn new(config: AppConfig, settings: AiSettings) -> Result<Self, ServerError> {
        let transcripts = TranscriptService::new(&config.transcript)?;
        Self::with_transcripts(config, settings, transcripts)
    }

    pub fn with_transcripts(
        config: AppConfig,
        settings: AiSettings,
        transcripts: TranscriptService,
    ) -> Result<Self, ServerError> {
        let client = build_client(&config.providers)?;

        Ok(Self {
            store: SettingsStore::new(&config.settings_path),
            config,
            settings: RwLock::new(settings),
            transcripts,
            client,
        })
    }

    /// An assistant for the stored settings with the request's overrides applied
    pub async fn assistant(&self, changes: &SettingsOverride) -> StudyAssistant {
        let settings = changes
            .apply(&*self.settings.read().await)
            .resolve(&self.config.default_ai);
        StudyAssistant::with_client(
            settings,
            self.config.providers.clone(),
            self.client.clone(),
        )
    }
}

/// Error body returned by every route
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(err: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed: {}", self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::EmptyInput => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            other => Self::internal(other),
        }
    }
}

impl From<TranscriptError> for ApiError {
    fn from(err: TranscriptError) -> Self {
        let status = match err {
            TranscriptError::InvalidVideoId(_) => StatusCode::BAD_REQUEST,
            TranscriptError::VideoUnavailable(_)
            | TranscriptError::TranscriptsDisabled(_)
            | TranscriptError::NoTranscript(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Transcript(e) => e.into(),
            ContentError::EmptyText => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            other => Self::internal(other),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        Self::internal(err)
    }
}

/// Unwrap a JSON body, reporting a body that does not fit `T` with `status`
fn read_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    status: StatusCode,
) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::new(status, rejection.body_text()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
    pub context: Option<String>,
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(flatten)]
    pub settings: SettingsOverride,
}

/// Body of the summary, quiz and flashcard routes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequest {
    #[serde(default)]
    pub content: String,
    /// Used as the study text when `content` is blank
    pub video_id: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub num_questions: Option<usize>,
    #[serde(flatten)]
    pub settings: SettingsOverride,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRequest {
    pub video_id: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/youtube-transcript", post(youtube_transcript))
        .route("/api/youtube/transcript", post(youtube_transcript))
        .route("/api/summary", post(summary))
        .route("/api/quiz", post(quiz))
        .route("/api/flashcards", post(flashcards))
        .route("/api/settings", post(update_settings).get(current_settings))
        .with_state(state)
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = read_body(payload, StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut messages = request.history;
    messages.push(ChatMessage::user(request.prompt));

    let response = state
        .assistant(&request.settings)
        .await
        .chat_with_system_prompt(
            &messages,
            request.context.as_deref(),
            request.system_prompt.as_deref(),
        )
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({ "response": response })))
}

async fn youtube_transcript(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = read_body(payload, StatusCode::BAD_REQUEST)?;
    let video_id = request
        .video_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "videoId is required"))?;

    let transcript = state.transcripts.transcript(&video_id).await?;
    Ok(Json(json!({ "transcript": transcript })))
}

/// The study text for a tool request: inline content, else the video transcript
async fn study_text(state: &AppState, request: &ToolRequest) -> Result<String, ApiError> {
    if request.content.trim().is_empty() {
        if let Some(video) = request.video_id.as_deref().filter(|v| !v.trim().is_empty()) {
            return Ok(StudySource::YouTube(video.to_string())
                .load(&state.transcripts)
                .await?);
        }
    }
    Ok(request.content.clone())
}

async fn summary(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ToolRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = read_body(payload, StatusCode::BAD_REQUEST)?;
    let content = study_text(&state, &request).await?;
    let summary = state
        .assistant(&request.settings)
        .await
        .generate_summary(&content)
        .await?;
    Ok(Json(json!({ "summary": summary })))
}

async fn quiz(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ToolRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = read_body(payload, StatusCode::BAD_REQUEST)?;
    let content = study_text(&state, &request).await?;
    let defaults = QuizOptions::default();
    let options = QuizOptions {
        difficulty: request.difficulty.unwrap_or(defaults.difficulty),
        num_questions: request.num_questions.unwrap_or(defaults.num_questions),
    };
    let questions = state
        .assistant(&request.settings)
        .await
        .generate_quiz(&content, options)
        .await?;
    Ok(Json(json!({ "questions": questions })))
}

async fn flashcards(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ToolRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = read_body(payload, StatusCode::BAD_REQUEST)?;
    let content = study_text(&state, &request).await?;
    let flashcards = state
        .assistant(&request.settings)
        .await
        .generate_flashcards(&content)
        .await?;
    Ok(Json(json!({ "flashcards": flashcards })))
}

async fn current_settings(State(state): State<Arc<AppState>>) -> Json<Value> {
    let settings = state.settings.read().await.clone();
    Json(json!({
        "settings": settings,
        "availableProviders": ProviderFactory::available_providers(),
    }))
}

/// Merge the posted fields into the stored settings and persist them
async fn update_settings(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SettingsOverride>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let changes = read_body(payload, StatusCode::BAD_REQUEST)?;

    let mut settings = state.settings.write().await;
    let updated = changes.apply(&settings);
    state.store.save(&updated).await?;
    info!(
        "Settings saved to {} (provider {})",
        state.store.path().display(),
        updated.ai_model
    );
    *settings = updated.clone();

    Ok(Json(json!({ "settings": updated })))
}

/// Load persisted settings, bind the configured address and serve until shutdown
pub async fn serve(config: AppConfig) -> Result<(), ServerError> {
    let settings = SettingsStore::new(&config.settings_path).load().await?;
    info!("Using AI provider {}", settings.ai_model);

    let address = config.server.bind_address.clone();
    let state = Arc::new(AppState::new(config, settings)?);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on {}", address);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: TranscriptError) -> StatusCode {
        ApiError::from(err).status
    }

    #[test]
    fn test_transcript_error_statuses() {
        let id = || "x".to_string();
        assert_eq!(
            status_of(TranscriptError::InvalidVideoId(id())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TranscriptError::NoTranscript(id())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(TranscriptError::TranscriptsDisabled(id())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(TranscriptError::VideoUnavailable(id())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(TranscriptError::TooManyRequests),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(TranscriptError::Http(502)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_ai_error_statuses() {
        let empty = ApiError::from(AiError::EmptyInput);
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);

        let invalid = ApiError::from(AiError::InvalidJson("nope".into()));
        assert_eq!(invalid.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_tool_request_accepts_flattened_settings() {
        let request: ToolRequest = serde_json::from_str(
            r#"{"content":"notes","difficulty":"hard","numQuestions":3,"aiModel":"gemini","apiKey":"g","temperature":0.2}"#,
        )
        .unwrap();
        assert_eq!(request.difficulty, Some(Difficulty::Hard));
        assert_eq!(request.num_questions, Some(3));
        assert_eq!(request.settings.api_key.as_deref(), Some("g"));
        assert_eq!(request.settings.temperature, Some(0.2));
    }
}
