// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prompt template rendering.
//!
//! Template bodies are JSON documents:
//!
//! ```json
//! { "system_prompt": "You are a nutritionist...",
//!   "user_context": { "age": "{{age}}", "goal": "{{goal_type}}" } }
//! ```
//!
//! Placeholders are substituted textually. Values are escaped for a JSON
//! string context so user-supplied text cannot break the document.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::AppError;

/// Named prompt parameters. `None` renders as the empty string.
pub type PromptParams = BTreeMap<String, Option<String>>;

/// A rendered template split into the two parts every backend accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    pub system: String,
    /// Serialized `user_context` object, sent as the user message.
    pub user: String,
}

/// Result of textual substitution, before JSON parsing.
#[derive(Debug)]
pub struct Substitution {
    pub text: String,
    /// Placeholders that had no value and were blanked.
    pub blanked: Vec<String>,
}

/// Replace every `{{name}}` in `body`.
///
/// Unknown names and `None` values become the empty string.
pub fn substitute(body: &str, params: &PromptParams) -> Substitution {
    let mut text = String::with_capacity(body.len());
    let mut blanked = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        text.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            // Unterminated: keep the remainder verbatim.
            text.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let name = after_open[..end].trim();
        match params.get(name) {
            Some(Some(value)) => text.push_str(&escape_json_fragment(value)),
            _ => blanked.push(name.to_string()),
        }
        rest = &after_open[end + 2..];
    }
    text.push_str(rest);

    Substitution { text, blanked }
}

/// Render a template body into system and user messages.
pub fn render(body: &str, params: &PromptParams) -> Result<RenderedPrompt, AppError> {
    let Substitution { text, blanked } = substitute(body, params);
    if !blanked.is_empty() {
        tracing::warn!(placeholders = ?blanked, "Prompt placeholders rendered empty");
    }

    split_document(&text)
}

/// Check that a template body renders to a usable document.
///
/// Every placeholder is blanked for the check.
pub fn validate_body(body: &str) -> Result<(), AppError> {
    split_document(&substitute(body, &PromptParams::new()).text).map(|_| ())
}

fn split_document(text: &str) -> Result<RenderedPrompt, AppError> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| AppError::InvalidTemplate(format!("body is not valid JSON: {}", e)))?;

    let system = doc
        .get("system_prompt")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::InvalidTemplate("missing system_prompt".to_string()))?
        .to_string();

    let user = match doc.get("user_context") {
        Some(ctx @ Value::Object(_)) => ctx.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return Err(AppError::InvalidTemplate("missing user_context".to_string())),
    };

    Ok(RenderedPrompt { system, user })
}

/// Escape a value for insertion inside a JSON string literal.
fn escape_json_fragment(value: &str) -> String {
    let quoted = Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
