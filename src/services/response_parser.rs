//! Recovers a question set from free-form model output.
//!
//! Models wrap the JSON array in prose or markdown fences and sometimes emit raw control
//! characters inside string values. Parsing goes: strip fences, take the first balanced
//! top-level array, blank out control characters, then parse and check every element.

use crate::error::GenerationError;
use crate::models::question::{QuestionAnswerPair, QuestionSet};
use serde_json::Value as JsonValue;

const FENCE: &str = "```";

pub fn parse_question_set(raw: &str) -> Result<QuestionSet, GenerationError> {
    let cleaned = strip_code_fences(raw.trim());
    let candidate = extract_first_array(&cleaned).unwrap_or(cleaned.as_str());
    let sanitized = replace_control_chars(candidate);

    let value: JsonValue = serde_json::from_str(&sanitized)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    validate_question_set(value)
}

/// Removes ``` markers. A language tag such as `json` is dropped only when it follows an
/// opening fence and runs to the end of that line; everything else is payload.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut inside_block = false;

    while let Some(pos) = rest.find(FENCE) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + FENCE.len()..];

        if !inside_block {
            rest = &rest[language_tag_len(rest)..];
        }
        inside_block = !inside_block;
    }
    out.push_str(rest);
    out.trim().to_string()
}

fn language_tag_len(after_fence: &str) -> usize {
    let tag_len = after_fence
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(after_fence.len());
    match after_fence[tag_len..].chars().next() {
        Some('\n') | Some('\r') => tag_len,
        _ => 0,
    }
}

/// Returns the first top-level `[...]` whose brackets balance, ignoring brackets in strings.
pub fn extract_first_array(text: &str) -> Option<&str> {
    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut start = None;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &text[s..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn replace_control_chars(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 32 { ' ' } else { c })
        .collect()
}

fn validate_question_set(value: JsonValue) -> Result<QuestionSet, GenerationError> {
    let items = match value {
        JsonValue::Array(items) => items,
        other => {
            return Err(GenerationError::UnexpectedShape(format!(
                "expected an array, got {}",
                kind_of(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let question = required_text(&item, "question", idx)?;
            let answer = required_text(&item, "answer", idx)?;
            Ok(QuestionAnswerPair { question, answer })
        })
        .collect()
}

fn required_text(item: &JsonValue, field: &str, idx: usize) -> Result<String, GenerationError> {
    let obj = item.as_object().ok_or_else(|| {
        GenerationError::UnexpectedShape(format!("item {} is {}, not an object", idx, kind_of(item)))
    })?;
    match obj.get(field) {
        Some(JsonValue::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(JsonValue::String(_)) => Err(GenerationError::UnexpectedShape(format!(
            "item {} has an empty '{}'",
            idx, field
        ))),
        Some(other) => Err(GenerationError::UnexpectedShape(format!(
            "item {} field '{}' is {}, not a string",
            idx,
            field,
            kind_of(other)
        ))),
        None => Err(GenerationError::UnexpectedShape(format!(
            "item {} is missing '{}'",
            idx, field
        ))),
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
