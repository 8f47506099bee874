// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress tracking: daily logs, body measurements, workout history and
//! range summaries.

use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::tracking::{DailyFields, MeasurementFields, NewWorkoutEntry};
use crate::models::{BodyMeasurement, DailyTracking, TrackingSummary, WorkoutEntry};

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(AppError::BadRequest(format!(
            "start {} is after end {}",
            start, end
        )));
    }
    Ok(())
}

pub struct TrackingService {
    db: Arc<dyn Store>,
}

impl TrackingService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Record a day, replacing any earlier entry for the same date.
    pub async fn save_daily(&self, user_id: u64, fields: DailyFields) -> Result<DailyTracking> {
        let now = Utc::now();
        fields
            .validate(now.date_naive())
            .map_err(AppError::BadRequest)?;

        let mut entry = DailyTracking::new(user_id, fields, now);
        if let Some(existing) = self.db.get_daily_tracking(user_id, entry.fields.date).await? {
            entry.created_at = existing.created_at;
        }
        self.db.upsert_daily_tracking(&entry).await?;

        tracing::info!(user_id, date = %entry.fields.date, "Daily tracking saved");
        Ok(entry)
    }

    pub async fn daily(&self, user_id: u64, date: NaiveDate) -> Result<DailyTracking> {
        self.db
            .get_daily_tracking(user_id, date)
            .await?
            .ok_or_else(|| AppError::TrackingNotFound(date.to_string()))
    }

    pub async fn daily_range(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyTracking>> {
        check_range(start, end)?;
        self.db.daily_tracking_between(user_id, start, end).await
    }

    /// Record measurements for a date, merging into an existing entry.
    pub async fn save_measurement(
        &self,
        user_id: u64,
        fields: MeasurementFields,
    ) -> Result<BodyMeasurement> {
        let now = Utc::now();
        fields
            .validate(now.date_naive())
            .map_err(AppError::BadRequest)?;

        let measurement = match self.db.get_body_measurement(user_id, fields.date).await? {
            Some(mut existing) => {
                existing.merge(&fields, now);
                existing
            }
            None => BodyMeasurement::new(user_id, fields, now),
        };
        self.db.upsert_body_measurement(&measurement).await?;

        tracing::info!(user_id, date = %measurement.fields.date, "Body measurement saved");
        Ok(measurement)
    }

    pub async fn measurements(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BodyMeasurement>> {
        check_range(start, end)?;
        self.db.body_measurements_between(user_id, start, end).await
    }

    pub async fn log_workout(&self, user_id: u64, new: NewWorkoutEntry) -> Result<WorkoutEntry> {
        let now = Utc::now();
        let today = now.date_naive();
        let date = new.date.unwrap_or(today);
        if date > today {
            return Err(AppError::BadRequest(
                "date cannot be in the future".to_string(),
            ));
        }
        new.log.validate().map_err(AppError::BadRequest)?;

        let entry = WorkoutEntry {
            id: Uuid::new_v4(),
            user_id,
            date,
            log: new.log,
            created_at: now,
        };
        self.db.insert_workout_entry(&entry).await?;

        tracing::info!(
            user_id,
            date = %entry.date,
            duration_minutes = entry.log.duration_minutes,
            "Workout logged"
        );
        Ok(entry)
    }

    pub async fn workouts(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutEntry>> {
        check_range(start, end)?;
        self.db.workout_entries_between(user_id, start, end).await
    }

    pub async fn summary(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TrackingSummary> {
        check_range(start, end)?;
        let days = self.db.daily_tracking_between(user_id, start, end).await?;
        let workouts = self.db.workout_entries_between(user_id, start, end).await?;
        let measurements = self
            .db
            .body_measurements_between(user_id, start, end)
            .await?;
        Ok(summarize(start, end, &days, &workouts, &measurements))
    }
}

/// Summarize records that all fall in `[start, end]`, each slice oldest first.
pub fn summarize(
    start: NaiveDate,
    end: NaiveDate,
    days: &[DailyTracking],
    workouts: &[WorkoutEntry],
    measurements: &[BodyMeasurement],
) -> TrackingSummary {
    let mut weights = days.iter().filter_map(|d| d.fields.weight_kg);
    let start_weight_kg = weights.next();
    let current_weight_kg = weights.last().or(start_weight_kg);
    let weight_change_kg = start_weight_kg
        .zip(current_weight_kg)
        .map(|(first, last)| last - first);

    let total_workout_minutes: u32 = workouts.iter().map(|w| w.log.duration_minutes).sum();
    let average_workout_minutes =
        (!workouts.is_empty()).then(|| total_workout_minutes as f32 / workouts.len() as f32);

    let range_days = (end - start).num_days() + 1;
    let adherence_percent = days.len() as f32 / range_days as f32 * 100.0;

    let mut measurement_changes = BTreeMap::new();
    if let [first, .., last] = measurements {
        let before: BTreeMap<&str, f32> = first.fields.values().collect();
        for (name, value) in last.fields.values() {
            if let Some(earlier) = before.get(name) {
                measurement_changes.insert(name.to_string(), value - earlier);
            }
        }
    }

    TrackingSummary {
        start,
        end,
        days_tracked: days.len(),
        start_weight_kg,
        current_weight_kg,
        weight_change_kg,
        workouts_completed: workouts.len(),
        total_workout_minutes,
        average_workout_minutes,
        adherence_percent,
        measurement_changes,
    }
}
