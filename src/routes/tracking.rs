// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress tracking routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::tracking::{DailyFields, MeasurementFields, NewWorkoutEntry};
use crate::models::{BodyMeasurement, DailyTracking, TrackingSummary, WorkoutEntry};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Days covered when a range query gives no start.
const DEFAULT_RANGE_DAYS: i64 = 30;

/// Tracking routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tracking/daily", get(list_daily).post(save_daily))
        .route("/api/tracking/daily/{date}", get(get_daily))
        .route(
            "/api/tracking/measurements",
            get(list_measurements).post(save_measurement),
        )
        .route(
            "/api/tracking/workouts",
            get(list_workouts).post(log_workout),
        )
        .route("/api/tracking/summary", get(summary))
}

#[derive(Deserialize)]
struct RangeQuery {
    /// First day, inclusive (YYYY-MM-DD)
    start: Option<String>,
    /// Last day, inclusive (YYYY-MM-DD); defaults to today
    end: Option<String>,
}

fn parse_date(raw: &str, name: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(format!("Invalid '{}' parameter: must be YYYY-MM-DD", name))
    })
}

impl RangeQuery {
    fn resolve(&self) -> Result<(NaiveDate, NaiveDate)> {
        let end = match &self.end {
            Some(raw) => parse_date(raw, "end")?,
            None => Utc::now().date_naive(),
        };
        let start = match &self.start {
            Some(raw) => parse_date(raw, "start")?,
            None => end - Duration::days(DEFAULT_RANGE_DAYS - 1),
        };
        Ok((start, end))
    }
}

// ─── Daily Tracking ──────────────────────────────────────────

async fn save_daily(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(fields): Json<DailyFields>,
) -> Result<(StatusCode, Json<DailyTracking>)> {
    let entry = state
        .tracking_service
        .save_daily(user.user_id, fields)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_daily(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Json<DailyTracking>> {
    let date = parse_date(&date, "date")?;
    Ok(Json(state.tracking_service.daily(user.user_id, date).await?))
}

async fn list_daily(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<DailyTracking>>> {
    let (start, end) = range.resolve()?;
    let entries = state
        .tracking_service
        .daily_range(user.user_id, start, end)
        .await?;
    Ok(Json(entries))
}

// ─── Measurements ────────────────────────────────────────────

async fn save_measurement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(fields): Json<MeasurementFields>,
) -> Result<(StatusCode, Json<BodyMeasurement>)> {
    let measurement = state
        .tracking_service
        .save_measurement(user.user_id, fields)
        .await?;
    Ok((StatusCode::CREATED, Json(measurement)))
}

async fn list_measurements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<BodyMeasurement>>> {
    let (start, end) = range.resolve()?;
    let measurements = state
        .tracking_service
        .measurements(user.user_id, start, end)
        .await?;
    Ok(Json(measurements))
}

// ─── Workouts ────────────────────────────────────────────────

async fn log_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new): Json<NewWorkoutEntry>,
) -> Result<(StatusCode, Json<WorkoutEntry>)> {
    let entry = state.tracking_service.log_workout(user.user_id, new).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn list_workouts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<WorkoutEntry>>> {
    let (start, end) = range.resolve()?;
    let entries = state
        .tracking_service
        .workouts(user.user_id, start, end)
        .await?;
    Ok(Json(entries))
}

// ─── Summary ─────────────────────────────────────────────────

async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<TrackingSummary>> {
    let (start, end) = range.resolve()?;
    let summary = state
        .tracking_service
        .summary(user.user_id, start, end)
        .await?;
    Ok(Json(summary))
}
