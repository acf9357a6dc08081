use crate::config::ProvidersConfig;
use crate::error::AiError;
use crate::providers::{LlmProvider, PromptInput, ProviderRequest};
use crate::settings::AiSettings;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

pub struct OpenAIProvider {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from settings and endpoint configuration
    pub fn new(settings: &AiSettings, config: &ProvidersConfig) -> Result<Self, AiError> {
        let api_key = settings.api_key.trim();
        if api_key.is_empty() {
            return Err(AiError::MissingApiKey("openai".to_string()));
        }

        Ok(OpenAIProvider {
            api_key: api_key.to_string(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            temperature: settings.temperature,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAIProvider {
            api_key,
            base_url,
            model,
            temperature: 0.7,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn build_request(&self, input: &PromptInput<'_>) -> Result<ProviderRequest, AiError> {
        input.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut messages = Vec::with_capacity(input.history.len() + 2);
        messages.push(json!({"role": "system", "content": input.system_text()}));
        for message in input.history {
            messages.push(json!({"role": message.role.as_str(), "content": message.content}));
        }
        messages.push(json!({"role": "user", "content": input.user_text()}));

        Ok(ProviderRequest {
            url: format!("{}/v1/chat/completions", self.base_url),
            headers,
            body: json!({
                "model": self.model,
                "messages": messages,
                "temperature": self.temperature
            }),
        })
    }

    fn extract_text(&self, body: &Value) -> Result<String, AiError> {
        extract_text(body)
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// `choices[0].message.content`
pub(crate) fn extract_text(body: &Value) -> Result<String, AiError> {
    let completion = ChatCompletion::deserialize(body)
        .map_err(|e| AiError::MalformedResponse(format!("unexpected OpenAI envelope: {}", e)))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            AiError::MalformedResponse(
                "OpenAI response has no choices[0].message.content".to_string(),
            )
        })
}
