pub mod config;
pub mod content;
pub mod error;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod server;
pub mod settings;
pub mod tools;
pub mod transcript;
pub mod validate;

pub use config::AppConfig;
pub use content::{extract_pdf_text, StudySource};
pub use error::{AiError, ContentError, ServerError, SettingsError, TranscriptError};
pub use model::{ChatMessage, Difficulty, Flashcard, QuizOptions, QuizQuestion, Role, ToolKind};
pub use settings::{AiModel, AiSettings, SettingsOverride, SettingsStore};
pub use tools::StudyAssistant;
pub use transcript::{TranscriptService, TranscriptSource};

pub async fn chat_with_ai(
    messages: &[ChatMessage],
    settings: &AiSettings,
    context: Option<&str>,
) -> Result<String, AiError> {
    StudyAssistant::new(settings.clone())?
        .chat(messages, context)
        .await
}

pub async fn generate_summary(content: &str, settings: &AiSettings) -> Result<String, AiError> {
    StudyAssistant::new(settings.clone())?
        .generate_summary(content)
        .await
}

pub async fn generate_quiz(
    content: &str,
    options: QuizOptions,
    settings: &AiSettings,
) -> Result<Vec<QuizQuestion>, AiError> {
    StudyAssistant::new(settings.clone())?
        .generate_quiz(content, options)
        .await
}

pub async fn generate_flashcards(
    content: &str,
    settings: &AiSettings,
) -> Result<Vec<Flashcard>, AiError> {
    StudyAssistant::new(settings.clone())?
        .generate_flashcards(content)
        .await
}
