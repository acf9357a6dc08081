use log::debug;
use reqwest::Client;

use crate::config::ProvidersConfig;
use crate::error::AiError;
use crate::model::{ChatMessage, Flashcard, QuizOptions, QuizQuestion, Role, ToolKind};
use crate::normalize::extract_json_array;
use crate::providers::{build_client, PromptInput, ProviderFactory};
use crate::settings::AiSettings;
use crate::validate::{validate_flashcards, validate_quiz};

/// Chat, summary, quiz and flashcard calls against the provider chosen in settings
pub struct StudyAssistant {
    settings: AiSettings,
    providers: ProvidersConfig,
    client: Client,
}

impl StudyAssistant {
    pub fn new(settings: AiSettings) -> Result<Self, AiError> {
        Self::with_config(settings, ProvidersConfig::default())
    }

    pub fn with_config(settings: AiSettings, providers: ProvidersConfig) -> Result<Self, AiError> {
        let client = build_client(&providers)?;
        Ok(Self::with_client(settings, providers, client))
    }

    /// Share an existing HTTP client (and its connection pool)
    pub fn with_client(settings: AiSettings, providers: ProvidersConfig, client: Client) -> Self {
        Self {
            settings,
            providers,
            client,
        }
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }

    /// Send one tool request and return the provider's text
    pub async fn complete(&self, input: &PromptInput<'_>) -> Result<String, AiError> {
        input.validate()?;
        let provider = ProviderFactory::create(&self.settings, &self.providers)?;
        debug!(
            "Sending {} request to {}",
            input.tool.name(),
            provider.provider_name()
        );
        provider.complete(&self.client, input).await
    }

    /// Answer the last user message, with earlier messages as history and
    /// `context` as the study content
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        context: Option<&str>,
    ) -> Result<String, AiError> {
        self.chat_with_system_prompt(messages, context, None).await
    }

    pub async fn chat_with_system_prompt(
        &self,
        messages: &[ChatMessage],
        context: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<String, AiError> {
        let (prompt, history) = split_last_user(messages);
        let input = PromptInput::new(ToolKind::Chat, context.unwrap_or(""), prompt)
            .with_history(history)
            .with_system_prompt(system_prompt);
        self.complete(&input).await
    }

    pub async fn generate_summary(&self, content: &str) -> Result<String, AiError> {
        self.complete(&PromptInput::new(ToolKind::Summary, content, ""))
            .await
    }

    /// Generate a multiple-choice quiz; extra questions beyond the requested count are dropped
    pub async fn generate_quiz(
        &self,
        content: &str,
        options: QuizOptions,
    ) -> Result<Vec<QuizQuestion>, AiError> {
        let options = QuizOptions {
            num_questions: options.num_questions.max(1),
            ..options
        };
        let text = self
            .complete(&PromptInput::new(ToolKind::Quiz(options), content, ""))
            .await?;

        let mut questions = validate_quiz(&extract_json_array(&text)?)?;
        if questions.len() > options.num_questions {
            debug!(
                "Model returned {} questions, keeping {}",
                questions.len(),
                options.num_questions
            );
            questions.truncate(options.num_questions);
        }
        Ok(questions)
    }

    pub async fn generate_flashcards(&self, content: &str) -> Result<Vec<Flashcard>, AiError> {
        let text = self
            .complete(&PromptInput::new(ToolKind::Flashcards, content, ""))
            .await?;
        validate_flashcards(&extract_json_array(&text)?)
    }
}

/// The last user message and everything said before it
fn split_last_user(messages: &[ChatMessage]) -> (&str, &[ChatMessage]) {
    match messages.iter().rposition(|m| m.role == Role::User) {
        Some(index) => (messages[index].content.as_str(), &messages[..index]),
        None => ("", messages),
    }
}
