//! Schema checks and coercions for quiz and flashcard answers.

use serde_json::{Map, Value};

use crate::error::AiError;
use crate::model::{Flashcard, QuizQuestion};

/// Fewest questions a quiz answer may contain
pub const MIN_QUIZ_QUESTIONS: usize = 1;

/// Fewest cards a flashcard answer may contain; the prompt asks for 5 to 15
pub const MIN_FLASHCARDS: usize = 5;

const OPTION_COUNT: usize = 4;

/// Validate raw quiz items, coercing object-shaped options and letter answers
pub fn validate_quiz(raw: &[Value]) -> Result<Vec<QuizQuestion>, AiError> {
    if raw.len() < MIN_QUIZ_QUESTIONS {
        return Err(AiError::TooFewItems {
            kind: "quiz questions",
            minimum: MIN_QUIZ_QUESTIONS,
            actual: raw.len(),
        });
    }

    raw.iter()
        .enumerate()
        .map(|(index, item)| {
            validate_question(item)
                .map_err(|reason| AiError::InvalidQuestionShape { index, reason })
        })
        .collect()
}

/// Validate raw flashcard items
pub fn validate_flashcards(raw: &[Value]) -> Result<Vec<Flashcard>, AiError> {
    if raw.len() < MIN_FLASHCARDS {
        return Err(AiError::TooFewItems {
            kind: "flashcards",
            minimum: MIN_FLASHCARDS,
            actual: raw.len(),
        });
    }

    raw.iter()
        .enumerate()
        .map(|(index, item)| {
            validate_card(item).map_err(|reason| AiError::InvalidFlashcardShape { index, reason })
        })
        .collect()
}

fn validate_question(item: &Value) -> Result<QuizQuestion, String> {
    let object = as_object(item)?;

    Ok(QuizQuestion {
        question: required_text(object, "question")?,
        options: coerce_options(object.get("options"))?,
        correct_answer: coerce_answer(object.get("correctAnswer"))?,
        explanation: required_text(object, "explanation")?,
    })
}

fn validate_card(item: &Value) -> Result<Flashcard, String> {
    let object = as_object(item)?;

    Ok(Flashcard {
        front: required_text(object, "front")?,
        back: required_text(object, "back")?,
    })
}

fn as_object(item: &Value) -> Result<&Map<String, Value>, String> {
    item.as_object()
        .ok_or_else(|| format!("expected an object, found {}", item))
}

/// Strings pass through, numbers and booleans are stringified
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required_text(object: &Map<String, Value>, field: &str) -> Result<String, String> {
    let value = object
        .get(field)
        .ok_or_else(|| format!("{} is missing", field))?;
    let text = scalar_text(value).ok_or_else(|| format!("{} must be text", field))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is empty", field));
    }
    Ok(trimmed.to_string())
}

/// Arrays are taken as-is; objects keyed "A".."D" contribute their values in key order
fn coerce_options(value: Option<&Value>) -> Result<[String; OPTION_COUNT], String> {
    let values: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        Some(other) => return Err(format!("options must be a list, found {}", other)),
        None => return Err("options is missing".to_string()),
    };

    if values.len() != OPTION_COUNT {
        return Err(format!(
            "expected {} options, found {}",
            OPTION_COUNT,
            values.len()
        ));
    }

    let options = values
        .into_iter()
        .enumerate()
        .map(|(i, v)| scalar_text(v).ok_or_else(|| format!("option {} must be text", i)))
        .collect::<Result<Vec<_>, _>>()?;

    options
        .try_into()
        .map_err(|_| format!("expected {} options", OPTION_COUNT))
}

/// Numeric indexes pass through; "A".."D" (any case) and "0".."3" are converted
fn coerce_answer(value: Option<&Value>) -> Result<usize, String> {
    let index = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| format!("correctAnswer must be a whole number, found {}", n))?,
        Some(Value::String(s)) => letter_index(s.trim())
            .ok_or_else(|| format!("correctAnswer {:?} is not a letter A-D or index 0-3", s))?,
        Some(other) => return Err(format!("correctAnswer has unexpected type: {}", other)),
        None => return Err("correctAnswer is missing".to_string()),
    };

    if index >= OPTION_COUNT {
        return Err(format!("correctAnswer {} is out of range 0-3", index));
    }
    Ok(index)
}

fn letter_index(answer: &str) -> Option<usize> {
    let mut chars = answer.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match c.to_ascii_uppercase() {
        letter @ 'A'..='D' => Some(letter as usize - 'A' as usize),
        digit @ '0'..='3' => Some(digit as usize - '0' as usize),
        _ => None,
    }
}
