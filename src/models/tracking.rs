// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Progress tracking records: daily logs, body measurements and completed
//! workouts, plus the summary computed over a date range.
//!
//! Dates are calendar days (`YYYY-MM-DD`). Daily logs and measurements are
//! keyed by `(user_id, date)`, so saving the same day again replaces or
//! merges the earlier entry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Document ID for records that exist at most once per user and day.
pub fn day_key(user_id: u64, date: NaiveDate) -> String {
    format!("{}_{}", user_id, date)
}

fn not_future(what: &str, date: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if date > today {
        return Err(format!("{} cannot be in the future", what));
    }
    Ok(())
}

// ─── Logs ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealLog {
    pub meal_number: u32,
    pub meal_type: Option<String>,
    pub name: String,
    pub food_items: Vec<String>,
    pub total_calories: Option<u32>,
    pub macros: BTreeMap<String, u32>,
    /// Eaten as the active plan prescribed.
    pub planned_meal: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseLog {
    pub name: String,
    pub sets: Option<u32>,
    pub reps: Option<String>,
    pub weight_kg: Option<f32>,
    pub rest_seconds: Option<u32>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutLog {
    pub workout_name: String,
    pub duration_minutes: u32,
    pub calories_burned: Option<u32>,
    pub exercises: Vec<ExerciseLog>,
    pub notes: Option<String>,
    pub completed: bool,
    pub planned_workout: bool,
}

impl MealLog {
    fn validate(&self) -> Result<(), String> {
        if self.meal_number == 0 {
            return Err("meal_number must be at least 1".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("meal name is required".to_string());
        }
        Ok(())
    }
}

impl WorkoutLog {
    pub fn validate(&self) -> Result<(), String> {
        if self.workout_name.trim().is_empty() {
            return Err("workout_name is required".to_string());
        }
        if !(5..=300).contains(&self.duration_minutes) {
            return Err("duration_minutes must be between 5 and 300".to_string());
        }
        for exercise in &self.exercises {
            if exercise.name.trim().is_empty() {
                return Err("exercise name is required".to_string());
            }
            if let Some(sets) = exercise.sets {
                if !(1..=20).contains(&sets) {
                    return Err("sets must be between 1 and 20".to_string());
                }
            }
        }
        Ok(())
    }
}

// ─── Daily Tracking ──────────────────────────────────────────

/// What the user logs for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFields {
    pub date: NaiveDate,
    pub weight_kg: Option<f32>,
    pub water_ml: Option<u32>,
    #[serde(default)]
    pub meals: Vec<MealLog>,
    pub workout: Option<WorkoutLog>,
    pub progress_photo_url: Option<String>,
    pub notes: Option<String>,
}

impl DailyFields {
    pub fn validate(&self, today: NaiveDate) -> Result<(), String> {
        not_future("date", self.date, today)?;
        if let Some(weight) = self.weight_kg {
            if !(30.0..=300.0).contains(&weight) {
                return Err("weight_kg must be between 30 and 300".to_string());
            }
        }
        if let Some(water) = self.water_ml {
            if water > 10_000 {
                return Err("water_ml must be at most 10000".to_string());
            }
        }
        for meal in &self.meals {
            meal.validate()?;
        }
        if let Some(workout) = &self.workout {
            workout.validate()?;
        }
        Ok(())
    }
}

/// One stored day of tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTracking {
    /// `{user_id}_{date}`
    pub id: String,
    pub user_id: u64,
    #[serde(flatten)]
    pub fields: DailyFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyTracking {
    pub fn new(user_id: u64, fields: DailyFields, now: DateTime<Utc>) -> Self {
        Self {
            id: day_key(user_id, fields.date),
            user_id,
            fields,
            created_at: now,
            updated_at: now,
        }
    }
}

// ─── Body Measurements ───────────────────────────────────────

/// Circumferences in centimeters. Absent values are not recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementFields {
    pub date: NaiveDate,
    pub chest_cm: Option<f32>,
    pub waist_cm: Option<f32>,
    pub hips_cm: Option<f32>,
    pub arms_cm: Option<f32>,
    pub thighs_cm: Option<f32>,
}

impl MeasurementFields {
    pub fn validate(&self, today: NaiveDate) -> Result<(), String> {
        not_future("date", self.date, today)?;
        let bounds = [
            ("chest_cm", self.chest_cm, 30.0, 200.0),
            ("waist_cm", self.waist_cm, 30.0, 200.0),
            ("hips_cm", self.hips_cm, 30.0, 200.0),
            ("arms_cm", self.arms_cm, 15.0, 100.0),
            ("thighs_cm", self.thighs_cm, 20.0, 150.0),
        ];
        for (name, value, min, max) in bounds {
            if let Some(v) = value {
                if !(min..=max).contains(&v) {
                    return Err(format!("{} must be between {} and {}", name, min, max));
                }
            }
        }
        Ok(())
    }

    /// Named values that are present, in a fixed order.
    pub fn values(&self) -> impl Iterator<Item = (&'static str, f32)> {
        [
            ("chest_cm", self.chest_cm),
            ("waist_cm", self.waist_cm),
            ("hips_cm", self.hips_cm),
            ("arms_cm", self.arms_cm),
            ("thighs_cm", self.thighs_cm),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurement {
    /// `{user_id}_{date}`
    pub id: String,
    pub user_id: u64,
    #[serde(flatten)]
    pub fields: MeasurementFields,
    pub updated_at: DateTime<Utc>,
}

impl BodyMeasurement {
    pub fn new(user_id: u64, fields: MeasurementFields, now: DateTime<Utc>) -> Self {
        Self {
            id: day_key(user_id, fields.date),
            user_id,
            fields,
            updated_at: now,
        }
    }

    /// Overwrite with every value present in `update`; keep the rest.
    pub fn merge(&mut self, update: &MeasurementFields, now: DateTime<Utc>) {
        let f = &mut self.fields;
        f.chest_cm = update.chest_cm.or(f.chest_cm);
        f.waist_cm = update.waist_cm.or(f.waist_cm);
        f.hips_cm = update.hips_cm.or(f.hips_cm);
        f.arms_cm = update.arms_cm.or(f.arms_cm);
        f.thighs_cm = update.thighs_cm.or(f.thighs_cm);
        self.updated_at = now;
    }
}

// ─── Workout History ─────────────────────────────────────────

/// A completed workout as submitted; the date defaults to today.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkoutEntry {
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub log: WorkoutLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: Uuid,
    pub user_id: u64,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub log: WorkoutLog,
    pub created_at: DateTime<Utc>,
}

// ─── Summary ─────────────────────────────────────────────────

/// Progress over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days_tracked: usize,
    pub start_weight_kg: Option<f32>,
    pub current_weight_kg: Option<f32>,
    pub weight_change_kg: Option<f32>,
    pub workouts_completed: usize,
    pub total_workout_minutes: u32,
    pub average_workout_minutes: Option<f32>,
    /// Share of days in the range with a tracking entry, 0-100.
    pub adherence_percent: f32,
    /// Last minus first value, for each measurement present in both.
    pub measurement_changes: BTreeMap<String, f32>,
}
