use crate::config::ProvidersConfig;
use crate::error::AiError;
use crate::providers::{GeminiProvider, LlmProvider, OpenAIProvider};
use crate::settings::{AiModel, AiSettings};

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the provider selected by the settings
    pub fn create(
        settings: &AiSettings,
        config: &ProvidersConfig,
    ) -> Result<Box<dyn LlmProvider>, AiError> {
        match settings.ai_model {
            AiModel::OpenAI => Ok(Box::new(OpenAIProvider::new(settings, config)?)),
            AiModel::Gemini => Ok(Box::new(GeminiProvider::new(settings, config)?)),
            other => Err(AiError::UnsupportedProvider(other.to_string())),
        }
    }

    /// List the provider ids that can build requests
    pub fn available_providers() -> Vec<&'static str> {
        vec![AiModel::OpenAI.as_str(), AiModel::Gemini.as_str()]
    }
}
