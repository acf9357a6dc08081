use crate::config::ProvidersConfig;
use crate::error::AiError;
use crate::model::Role;
use crate::providers::{LlmProvider, PromptInput, ProviderRequest};
use crate::settings::AiSettings;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

const API_KEY_HEADER: &str = "x-goog-api-key";
const JSON_MIME_TYPE: &str = "application/json";

pub struct GeminiProvider {
    api_key: String,
    endpoint: String,
    temperature: f64,
}

impl GeminiProvider {
    /// Create a new Gemini provider; a custom endpoint in the settings wins over the configured one
    pub fn new(settings: &AiSettings, config: &ProvidersConfig) -> Result<Self, AiError> {
        let api_key = settings.api_key.trim();
        if api_key.is_empty() {
            return Err(AiError::MissingApiKey("gemini".to_string()));
        }

        let endpoint = settings
            .custom_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .unwrap_or(config.gemini_endpoint.as_str())
            .to_string();

        Ok(GeminiProvider {
            api_key: api_key.to_string(),
            endpoint,
            temperature: settings.temperature,
        })
    }

    /// Gemini is called single-shot, so history and prompt are folded into one text part
    fn single_shot_text(input: &PromptInput<'_>) -> String {
        let mut sections = vec![input.system_text()];

        if !input.history.is_empty() {
            let transcript = input
                .history
                .iter()
                .map(|message| {
                    let speaker = match message.role {
                        Role::User => "User",
                        Role::Assistant => "Assistant",
                        Role::System => "System",
                    };
                    format!("{}: {}", speaker, message.content)
                })
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("Conversation so far:\n{}", transcript));
        }

        sections.push(input.user_text());
        sections.join("\n\n")
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn build_request(&self, input: &PromptInput<'_>) -> Result<ProviderRequest, AiError> {
        input.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_str(&self.api_key)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut generation_config = json!({ "temperature": self.temperature });
        if input.tool.expects_json() {
            generation_config["responseMimeType"] = json!(JSON_MIME_TYPE);
        }

        Ok(ProviderRequest {
            url: self.endpoint.clone(),
            headers,
            body: json!({
                "contents": [{
                    "role": "user",
                    "parts": [{
                        "text": Self::single_shot_text(input)
                    }]
                }],
                "generationConfig": generation_config
            }),
        })
    }

    fn extract_text(&self, body: &Value) -> Result<String, AiError> {
        extract_text(body)
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// `candidates[0].content.parts[0].text`
pub(crate) fn extract_text(body: &Value) -> Result<String, AiError> {
    let response = GenerateContentResponse::deserialize(body)
        .map_err(|e| AiError::MalformedResponse(format!("unexpected Gemini envelope: {}", e)))?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| {
            AiError::MalformedResponse(
                "Gemini response has no candidates[0].content.parts[0].text".to_string(),
            )
        })
}
