// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("No tracking entry: {0}")]
    TrackingNotFound(String),

    #[error("No active prompt template for {0}")]
    NoTemplateFound(String),

    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A single LLM backend call failed (transport, status or decoding).
    #[error("AI backend error: {0}")]
    AiBackend(String),

    /// The backend answered but the text was not a structured record of
    /// the requested plan type.
    #[error("Malformed AI response: {0}")]
    MalformedAiResponse(String),

    /// Both the preferred backend and the fallback failed.
    #[error("AI generation failed: {0}")]
    AiGenerationFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error came from an LLM call and should trigger the
    /// cross-backend fallback.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            AppError::AiBackend(_) | AppError::MalformedAiResponse(_)
        )
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            AppError::ProfileNotFound(msg) => (
                StatusCode::NOT_FOUND,
                "profile_not_found",
                Some(msg.clone()),
            ),
            AppError::PlanNotFound(msg) => {
                (StatusCode::NOT_FOUND, "plan_not_found", Some(msg.clone()))
            }
            AppError::TemplateNotFound(msg) => (
                StatusCode::NOT_FOUND,
                "template_not_found",
                Some(msg.clone()),
            ),
            AppError::TrackingNotFound(msg) => (
                StatusCode::NOT_FOUND,
                "tracking_not_found",
                Some(msg.clone()),
            ),
            AppError::NoTemplateFound(msg) => {
                tracing::error!(plan_type = %msg, "No active prompt template");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "no_template_found",
                    Some(msg.clone()),
                )
            }
            AppError::InvalidTemplate(msg) => {
                tracing::error!(error = %msg, "Invalid prompt template");
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_template", None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::AiBackend(msg) | AppError::MalformedAiResponse(msg) => {
                (StatusCode::BAD_GATEWAY, "ai_backend_error", Some(msg.clone()))
            }
            AppError::AiGenerationFailed(msg) => {
                tracing::error!(error = %msg, "AI generation failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "ai_generation_failed",
                    Some("Plan generation is temporarily unavailable".to_string()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
