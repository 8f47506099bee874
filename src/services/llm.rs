// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LLM backend abstraction.
//!
//! Two providers are interchangeable behind [`ChatBackend`]. Each takes a
//! system instruction plus a user message and returns free-form text, which
//! the gateway then requires to be a single JSON object.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::AppError;

/// Which provider served (or should serve) a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenAI-compatible chat completions; the default primary.
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
}

impl Backend {
    /// The backend used when the first choice fails.
    pub fn other(self) -> Self {
        match self {
            Backend::OpenAi => Backend::Anthropic,
            Backend::Anthropic => Backend::OpenAi,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::OpenAi => "openai",
            Backend::Anthropic => "anthropic",
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::OpenAi
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A chat completion provider.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Which provider this is.
    fn backend(&self) -> Backend;

    /// Model label recorded on plans this backend produces.
    fn model(&self) -> &str;

    /// Run one completion and return the raw response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError>;
}

/// Parse backend text as a structured record (a JSON object).
///
/// A surrounding markdown code fence is tolerated.
pub fn parse_structured_response(text: &str) -> Result<Map<String, Value>, AppError> {
    let body = strip_code_fence(text.trim());

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::MalformedAiResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(AppError::MalformedAiResponse(format!("invalid JSON: {}", e))),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening line.
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
