// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan generation and retrieval routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::plan::{CombinedPlan, MealPlan, WorkoutPlan};
use crate::models::PlanContent;
use crate::services::{GenerateRequest, GenerationResult, PlanSummary};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Plan routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/plans/generate", post(generate_plan))
        .route("/api/plans/active", get(active_plans))
        .route("/api/plans/{id}", get(get_plan).delete(delete_plan))
        .route("/api/plans/{id}/meal", get(get_meal_plan))
        .route("/api/plans/{id}/workout", get(get_workout_plan))
        .route("/api/plans/{id}/combined", get(get_combined_plan))
}

/// Plan with its content.
#[derive(Serialize)]
pub struct PlanResponse {
    #[serde(flatten)]
    pub summary: PlanSummary,
    pub content: PlanContent,
}

async fn generate_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerationResult>> {
    let result = state.plan_service.generate(user.user_id, &request).await?;
    Ok(Json(result))
}

async fn active_plans(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<PlanSummary>>> {
    Ok(Json(state.plan_service.active_for_user(user.user_id).await?))
}

async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanResponse>> {
    let plan = state.plan_service.get(id).await?;
    Ok(Json(PlanResponse {
        summary: PlanSummary::of(&plan, Utc::now()),
        content: plan.content,
    }))
}

async fn get_meal_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MealPlan>> {
    Ok(Json(state.plan_service.meal_view(id).await?))
}

async fn get_workout_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkoutPlan>> {
    Ok(Json(state.plan_service.workout_view(id).await?))
}

async fn get_combined_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CombinedPlan>> {
    Ok(Json(state.plan_service.combined_view(id).await?))
}

async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.plan_service.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
