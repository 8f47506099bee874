// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prompt template administration routes (admin users only).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::PromptTemplate;
use crate::services::NewTemplate;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route("/api/templates/{id}/deactivate", post(deactivate_template))
}

fn require_admin(state: &AppState, user: &AuthUser) -> Result<()> {
    if state.config.is_admin(user.user_id) {
        Ok(())
    } else {
        tracing::warn!(user_id = user.user_id, "Non-admin template access");
        Err(AppError::Forbidden("admin access required".to_string()))
    }
}

async fn list_templates(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<PromptTemplate>>> {
    require_admin(&state, &user)?;
    Ok(Json(state.template_service.list().await?))
}

async fn create_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new): Json<NewTemplate>,
) -> Result<(StatusCode, Json<PromptTemplate>)> {
    require_admin(&state, &user)?;

    let template = state.template_service.create(new).await?;
    // Cached responses were rendered from the previous template.
    state.plan_service.gateway().invalidate_cache();
    Ok((StatusCode::CREATED, Json(template)))
}

async fn deactivate_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<PromptTemplate>> {
    require_admin(&state, &user)?;

    let template = state.template_service.deactivate(id).await?;
    state.plan_service.gateway().invalidate_cache();
    Ok(Json(template))
}
