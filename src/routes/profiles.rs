// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and account routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileFields, ProfileUpdate, UserProfile};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Profile routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profiles", post(create_profile))
        .route(
            "/api/profiles/current",
            get(current_profile).put(update_current_profile),
        )
        .route("/api/profiles/{id}", get(get_profile))
        .route("/api/account", delete(delete_account))
}

async fn create_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(fields): Json<ProfileFields>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    let profile = state.profile_service.create(user.user_id, fields).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn current_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.profile_service.current(user.user_id).await?))
}

async fn update_current_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .profile_service
        .update_current(user.user_id, update)
        .await?;
    Ok(Json(profile))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.profile_service.get(user.user_id, id).await?))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub deleted: usize,
}

/// Delete the user's profiles and every plan generated for them.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(user_id = user.user_id, "User-initiated account deletion");

    let deleted = state.profile_service.delete_account(user.user_id).await?;
    Ok(Json(DeleteAccountResponse {
        success: true,
        deleted,
    }))
}
