mod factory;
mod gemini;
mod open_ai;
mod prompt;

pub use factory::ProviderFactory;
pub use gemini::GeminiProvider;
pub use open_ai::OpenAIProvider;
pub use prompt::{
    default_instruction, quiz_prompt, system_prompt, CHAT_PROMPT, FLASHCARDS_PROMPT,
    QUIZ_PROMPT_TEMPLATE, SUMMARY_PROMPT,
};

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value;

use crate::config::ProvidersConfig;
use crate::error::AiError;
use crate::model::{ChatMessage, ToolKind};
use crate::settings::{AiModel, AiSettings};

/// A fully prepared provider call
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Everything a provider needs to phrase one tool request
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub tool: ToolKind,
    /// Study material the tool works on
    pub content: &'a str,
    /// The user's request; may be empty for one-shot tools
    pub prompt: &'a str,
    /// Earlier chat turns, oldest first
    pub history: &'a [ChatMessage],
    /// Replaces the tool's built-in system prompt
    pub system_prompt: Option<&'a str>,
}

impl<'a> PromptInput<'a> {
    pub fn new(tool: ToolKind, content: &'a str, prompt: &'a str) -> Self {
        Self {
            tool,
            content,
            prompt,
            history: &[],
            system_prompt: None,
        }
    }

    pub fn with_history(mut self, history: &'a [ChatMessage]) -> Self {
        self.history = history;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<&'a str>) -> Self {
        self.system_prompt = system_prompt.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn validate(&self) -> Result<(), AiError> {
        if self.content.trim().is_empty() && self.prompt.trim().is_empty() {
            return Err(AiError::EmptyInput);
        }
        Ok(())
    }

    /// Tool system prompt followed by the study content
    pub fn system_text(&self) -> String {
        let system = match self.system_prompt {
            Some(custom) => custom.to_string(),
            None => system_prompt(&self.tool),
        };
        let content = self.content.trim();
        if content.is_empty() {
            system
        } else {
            format!("{}\n\nStudy content:\n{}", system.trim_end(), content)
        }
    }

    /// The final user turn
    pub fn user_text(&self) -> String {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            default_instruction(&self.tool)
        } else {
            prompt.to_string()
        }
    }
}

/// Unified trait for the supported chat-completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "gemini")
    fn provider_name(&self) -> &str;

    /// Build the HTTP request for one tool call
    fn build_request(&self, input: &PromptInput<'_>) -> Result<ProviderRequest, AiError>;

    /// Pull the generated text out of the provider's response envelope
    fn extract_text(&self, body: &Value) -> Result<String, AiError>;

    /// Build, send and normalize a single request. No retries.
    async fn complete(&self, client: &Client, input: &PromptInput<'_>) -> Result<String, AiError> {
        let request = self.build_request(input)?;
        let body = send(client, request).await?;
        self.extract_text(&body)
    }
}

/// HTTP client for provider calls, honouring the configured request timeout
pub fn build_client(config: &ProvidersConfig) -> Result<Client, AiError> {
    let mut builder = Client::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Send a prepared request and decode the JSON envelope
pub async fn send(client: &Client, request: ProviderRequest) -> Result<Value, AiError> {
    let response = client
        .post(&request.url)
        .headers(request.headers)
        .json(&request.body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(AiError::ProviderHttp {
            status: status.as_u16(),
            body: text,
        });
    }

    let response_body: Value = serde_json::from_str(&text)
        .map_err(|e| AiError::MalformedResponse(format!("response is not JSON: {}", e)))?;
    debug!("{:?}", response_body);
    Ok(response_body)
}

/// Build the request for a tool call with the default provider endpoints
pub fn build(
    tool: ToolKind,
    content: &str,
    prompt: &str,
    settings: &AiSettings,
) -> Result<ProviderRequest, AiError> {
    build_with_history(
        &PromptInput::new(tool, content, prompt),
        settings,
        &ProvidersConfig::default(),
    )
}

/// Build the request for a tool call, including chat history and endpoint configuration
pub fn build_with_history(
    input: &PromptInput<'_>,
    settings: &AiSettings,
    config: &ProvidersConfig,
) -> Result<ProviderRequest, AiError> {
    input.validate()?;
    ProviderFactory::create(settings, config)?.build_request(input)
}

/// Extract the generated text from a raw provider response
pub fn extract_text(provider: AiModel, raw: &Value) -> Result<String, AiError> {
    match provider {
        AiModel::OpenAI => open_ai::extract_text(raw),
        AiModel::Gemini => gemini::extract_text(raw),
        other => Err(AiError::UnsupportedProvider(other.to_string())),
    }
}
