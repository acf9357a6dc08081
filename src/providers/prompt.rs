use crate::model::{QuizOptions, ToolKind};

/// System prompts for each study tool.
///
/// The prompts are loaded from the `prompts/` directory at compile time using
/// `include_str!`, making them easy to edit without dealing with Rust string
/// syntax.
pub const CHAT_PROMPT: &str = include_str!("prompts/chat.txt");
pub const SUMMARY_PROMPT: &str = include_str!("prompts/summary.txt");
pub const FLASHCARDS_PROMPT: &str = include_str!("prompts/flashcards.txt");

/// Contains `{{NUM_QUESTIONS}}` and `{{DIFFICULTY}}` placeholders, filled by
/// [`quiz_prompt`].
pub const QUIZ_PROMPT_TEMPLATE: &str = include_str!("prompts/quiz.txt");

/// Injects the requested question count and difficulty into the quiz template.
pub fn quiz_prompt(options: &QuizOptions) -> String {
    QUIZ_PROMPT_TEMPLATE
        .replace("{{NUM_QUESTIONS}}", &options.num_questions.to_string())
        .replace("{{DIFFICULTY}}", &options.difficulty.to_string())
}

/// The system prompt for a tool
pub fn system_prompt(tool: &ToolKind) -> String {
    match tool {
        ToolKind::Chat => CHAT_PROMPT.to_string(),
        ToolKind::Quiz(options) => quiz_prompt(options),
        ToolKind::Flashcards => FLASHCARDS_PROMPT.to_string(),
        ToolKind::Summary => SUMMARY_PROMPT.to_string(),
    }
}

/// The user turn sent when the caller gave content but no prompt
pub fn default_instruction(tool: &ToolKind) -> String {
    match tool {
        ToolKind::Chat => "Give me an overview of this material.".to_string(),
        ToolKind::Quiz(options) => format!(
            "Generate the {} questions now as a JSON array.",
            options.num_questions
        ),
        ToolKind::Flashcards => "Generate the flashcards now as a JSON array.".to_string(),
        ToolKind::Summary => "Summarize the content now.".to_string(),
    }
}
