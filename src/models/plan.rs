// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Generated plan model: the stored record plus the typed plan content.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::models::profile::ProfileTraits;

/// How long a generated plan stays eligible as a cache hit.
pub const PLAN_LIFETIME_DAYS: i64 = 30;

/// Similarity score of a plan generated for exactly this profile.
pub const EXACT_SIMILARITY: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    MealPlan,
    WorkoutPlan,
    CombinedPlan,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::MealPlan => "MEAL_PLAN",
            PlanType::WorkoutPlan => "WORKOUT_PLAN",
            PlanType::CombinedPlan => "COMBINED_PLAN",
        }
    }

    /// Whether a plan of this type has a meal section.
    pub fn has_meals(&self) -> bool {
        matches!(self, PlanType::MealPlan | PlanType::CombinedPlan)
    }

    /// Whether a plan of this type has a workout section.
    pub fn has_workouts(&self) -> bool {
        matches!(self, PlanType::WorkoutPlan | PlanType::CombinedPlan)
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Plan Content ────────────────────────────────────────────

/// Macro-nutrient split, either for a whole plan or a single day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[serde(default)]
pub struct MacroSplit {
    pub protein_percentage: Option<u32>,
    pub carbs_percentage: Option<u32>,
    pub fats_percentage: Option<u32>,
    pub protein_grams: Option<u32>,
    pub carbs_grams: Option<u32>,
    pub fats_grams: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[serde(default)]
pub struct Meal {
    pub meal_number: Option<u32>,
    pub name: String,
    pub ingredients: Vec<String>,
    pub preparation: Option<String>,
    pub calories: Option<u32>,
    pub macros: std::collections::BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[serde(default)]
pub struct DailyMealPlan {
    pub day: u32,
    pub meals: Vec<Meal>,
    pub total_calories: Option<u32>,
    pub total_macros: Option<MacroSplit>,
}

/// Nutrition section of a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[serde(default)]
pub struct MealPlan {
    pub daily_calories: Option<u32>,
    pub macros: Option<MacroSplit>,
    pub daily_plans: Vec<DailyMealPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[serde(default)]
pub struct Exercise {
    pub name: String,
    pub sets: Option<u32>,
    /// Free-form, e.g. "8-12" or "AMRAP"
    pub reps: Option<String>,
    pub rest_seconds: Option<u32>,
    pub notes: Option<String>,
    pub alternative_exercise: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[serde(default)]
pub struct DailyWorkout {
    pub day: u32,
    pub focus: Option<String>,
    pub exercises: Vec<Exercise>,
    pub estimated_duration: Option<u32>,
    pub warmup: Option<String>,
    pub cooldown: Option<String>,
}

/// Training section of a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[serde(default)]
pub struct WorkoutPlan {
    pub focus: Option<String>,
    pub recommended_equipment: Option<String>,
    pub weekly_schedule: Vec<DailyWorkout>,
}

/// Meal and workout sections generated together, plus free-form advice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedPlan {
    pub meal: MealPlan,
    pub workout: WorkoutPlan,
    pub recommendations: Map<String, Value>,
}

/// Typed plan content, one shape per plan type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PlanContent {
    Meal(MealPlan),
    Workout(WorkoutPlan),
    Combined(CombinedPlan),
}

impl PlanContent {
    /// Interpret a structured LLM response as content for `plan_type`.
    ///
    /// Combined plans carry the meal and workout keys at the top level of the
    /// same record, next to an optional `recommendations` object. A record
    /// missing the defining section of its type is rejected even when it
    /// deserializes.
    pub fn from_record(plan_type: PlanType, record: Map<String, Value>) -> Result<Self, String> {
        let value = Value::Object(record);
        match plan_type {
            PlanType::MealPlan => {
                let meal = parse_section::<MealPlan>(&value, "meal plan")?;
                meal.check().map_err(|e| format!("meal plan: {}", e))?;
                Ok(PlanContent::Meal(meal))
            }
            PlanType::WorkoutPlan => {
                let workout = parse_section::<WorkoutPlan>(&value, "workout plan")?;
                workout.check().map_err(|e| format!("workout plan: {}", e))?;
                Ok(PlanContent::Workout(workout))
            }
            PlanType::CombinedPlan => {
                let meal = parse_section::<MealPlan>(&value, "combined plan (meal)")?;
                meal.check()
                    .map_err(|e| format!("combined plan (meal): {}", e))?;
                let workout = parse_section::<WorkoutPlan>(&value, "combined plan (workout)")?;
                workout
                    .check()
                    .map_err(|e| format!("combined plan (workout): {}", e))?;
                let recommendations = match value.get("recommendations") {
                    Some(Value::Object(map)) => map.clone(),
                    _ => Map::new(),
                };
                Ok(PlanContent::Combined(CombinedPlan {
                    meal,
                    workout,
                    recommendations,
                }))
            }
        }
    }

    pub fn plan_type(&self) -> PlanType {
        match self {
            PlanContent::Meal(_) => PlanType::MealPlan,
            PlanContent::Workout(_) => PlanType::WorkoutPlan,
            PlanContent::Combined(_) => PlanType::CombinedPlan,
        }
    }

    pub fn meal(&self) -> Option<&MealPlan> {
        match self {
            PlanContent::Meal(meal) => Some(meal),
            PlanContent::Combined(combined) => Some(&combined.meal),
            PlanContent::Workout(_) => None,
        }
    }

    pub fn workout(&self) -> Option<&WorkoutPlan> {
        match self {
            PlanContent::Workout(workout) => Some(workout),
            PlanContent::Combined(combined) => Some(&combined.workout),
            PlanContent::Meal(_) => None,
        }
    }
}

fn parse_section<T: serde::de::DeserializeOwned>(value: &Value, what: &str) -> Result<T, String> {
    serde_json::from_value(value.clone()).map_err(|e| format!("{}: {}", what, e))
}

impl MealPlan {
    /// A usable meal plan has at least one day with at least one named meal.
    fn check(&self) -> Result<(), String> {
        if self.daily_plans.is_empty() {
            return Err("daily_plans is missing or empty".to_string());
        }
        let meals = self.daily_plans.iter().flat_map(|d| d.meals.iter());
        let mut any = false;
        for meal in meals {
            if meal.name.trim().is_empty() {
                return Err("meal without a name".to_string());
            }
            any = true;
        }
        if !any {
            return Err("no meals in any day".to_string());
        }
        Ok(())
    }
}

impl WorkoutPlan {
    /// A usable workout plan has at least one day and one named exercise.
    /// Rest days without exercises are allowed.
    fn check(&self) -> Result<(), String> {
        if self.weekly_schedule.is_empty() {
            return Err("weekly_schedule is missing or empty".to_string());
        }
        let mut any = false;
        for exercise in self.weekly_schedule.iter().flat_map(|d| d.exercises.iter()) {
            if exercise.name.trim().is_empty() {
                return Err("exercise without a name".to_string());
            }
            any = true;
        }
        if !any {
            return Err("no exercises in any day".to_string());
        }
        Ok(())
    }
}

// ─── Stored Plan ─────────────────────────────────────────────

/// Plan record stored in the `plans` collection.
///
/// Immutable once written; the only mutation is deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Plan ID (also used as document ID)
    pub id: Uuid,
    /// User whose profile the plan was generated for
    pub user_id: u64,
    /// Fingerprint of the profile state this was generated for
    pub fingerprint: String,
    pub plan_type: PlanType,
    /// Profile traits at generation time, for similarity matching
    pub traits: ProfileTraits,
    pub content: PlanContent,
    /// Model label reported by the backend that produced the content
    pub model_used: String,
    pub similarity_score: f32,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Plan {
    /// Build a freshly generated plan expiring after [`PLAN_LIFETIME_DAYS`].
    pub fn generated(
        user_id: u64,
        fingerprint: String,
        traits: ProfileTraits,
        content: PlanContent,
        model_used: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            fingerprint,
            plan_type: content.plan_type(),
            traits,
            content,
            model_used,
            similarity_score: EXACT_SIMILARITY,
            generated_at: now,
            expires_at: now + Duration::days(PLAN_LIFETIME_DAYS),
        }
    }

    /// Expiry is evaluated at read time; expired plans stay in storage.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
