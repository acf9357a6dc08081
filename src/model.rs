use std::fmt;

use serde::{Deserialize, Serialize};

/// A validated multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: [String; 4],
    /// Index into `options`, always 0..=3
    pub correct_answer: usize,
    pub explanation: String,
}

/// A validated study card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOptions {
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,
}

fn default_num_questions() -> usize {
    5
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            num_questions: default_num_questions(),
        }
    }
}

/// The AI-backed feature a request is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Chat,
    Quiz(QuizOptions),
    Flashcards,
    Summary,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Chat => "chat",
            ToolKind::Quiz(_) => "quiz",
            ToolKind::Flashcards => "flashcards",
            ToolKind::Summary => "summary",
        }
    }

    /// Tools whose answer is a JSON array rather than prose
    pub fn expects_json(&self) -> bool {
        matches!(self, ToolKind::Quiz(_) | ToolKind::Flashcards)
    }
}
