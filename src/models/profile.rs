// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User profile model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    WeightLoss,
    MuscleGain,
    Maintenance,
    Recomposition,
    GeneralFitness,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::WeightLoss => "WEIGHT_LOSS",
            GoalType::MuscleGain => "MUSCLE_GAIN",
            GoalType::Maintenance => "MAINTENANCE",
            GoalType::Recomposition => "RECOMPOSITION",
            GoalType::GeneralFitness => "GENERAL_FITNESS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingExperience {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingLocation {
    Gym,
    Home,
    Outdoor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DietPreference {
    Normal,
    LowCarb,
    LowFat,
    Keto,
    Vegetarian,
    Vegan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetConstraint {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkoutTime {
    Morning,
    Afternoon,
    Evening,
}

/// The fitness-relevant subset of a profile: what the fingerprint and the
/// similarity matcher look at.
///
/// Plans carry a copy of this taken at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileTraits {
    pub gender: Gender,
    pub goal_type: GoalType,
    /// Age in years
    pub age: u32,
    /// Height in centimeters
    pub height_cm: f32,
    /// Current weight in kilograms
    pub weight_kg: f32,
}

/// Everything a user supplies about themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub gender: Gender,
    pub age: u32,
    pub height_cm: f32,
    pub current_weight_kg: f32,
    #[serde(default)]
    pub target_weight_kg: Option<f32>,
    pub goal_type: GoalType,
    pub training_experience: TrainingExperience,
    pub training_location: TrainingLocation,
    pub days_per_week: u8,
    pub diet_preference: DietPreference,
    pub meals_per_day: u8,
    #[serde(default)]
    pub snacks_per_day: u8,
    pub location_culture: String,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub food_allergies: Option<String>,
    #[serde(default)]
    pub time_per_workout_min: Option<u32>,
    #[serde(default)]
    pub equipment_available: Option<String>,
    #[serde(default)]
    pub budget_constraint: Option<BudgetConstraint>,
    #[serde(default)]
    pub preferred_workout_time: Option<WorkoutTime>,
}

impl ProfileFields {
    /// Reject values that cannot describe a real person.
    pub fn validate(&self) -> Result<(), String> {
        if !(10..=120).contains(&self.age) {
            return Err("age must be between 10 and 120".to_string());
        }
        if !(50.0..=260.0).contains(&self.height_cm) {
            return Err("height_cm must be between 50 and 260".to_string());
        }
        if !(20.0..=400.0).contains(&self.current_weight_kg) {
            return Err("current_weight_kg must be between 20 and 400".to_string());
        }
        if let Some(target) = self.target_weight_kg {
            if !(20.0..=400.0).contains(&target) {
                return Err("target_weight_kg must be between 20 and 400".to_string());
            }
        }
        if !(1..=7).contains(&self.days_per_week) {
            return Err("days_per_week must be between 1 and 7".to_string());
        }
        if !(1..=8).contains(&self.meals_per_day) {
            return Err("meals_per_day must be between 1 and 8".to_string());
        }
        if self.location_culture.len() > 100 {
            return Err("location_culture is too long".to_string());
        }
        Ok(())
    }
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub gender: Option<Gender>,
    pub age: Option<u32>,
    pub height_cm: Option<f32>,
    pub current_weight_kg: Option<f32>,
    pub target_weight_kg: Option<f32>,
    pub goal_type: Option<GoalType>,
    pub training_experience: Option<TrainingExperience>,
    pub training_location: Option<TrainingLocation>,
    pub days_per_week: Option<u8>,
    pub diet_preference: Option<DietPreference>,
    pub meals_per_day: Option<u8>,
    pub snacks_per_day: Option<u8>,
    pub location_culture: Option<String>,
    pub medical_conditions: Option<String>,
    pub food_allergies: Option<String>,
    pub time_per_workout_min: Option<u32>,
    pub equipment_available: Option<String>,
    pub budget_constraint: Option<BudgetConstraint>,
    pub preferred_workout_time: Option<WorkoutTime>,
}

impl ProfileUpdate {
    /// Apply this update onto existing fields.
    pub fn apply_to(self, fields: &mut ProfileFields) {
        if let Some(v) = self.gender {
            fields.gender = v;
        }
        if let Some(v) = self.age {
            fields.age = v;
        }
        if let Some(v) = self.height_cm {
            fields.height_cm = v;
        }
        if let Some(v) = self.current_weight_kg {
            fields.current_weight_kg = v;
        }
        if let Some(v) = self.goal_type {
            fields.goal_type = v;
        }
        if let Some(v) = self.training_experience {
            fields.training_experience = v;
        }
        if let Some(v) = self.training_location {
            fields.training_location = v;
        }
        if let Some(v) = self.days_per_week {
            fields.days_per_week = v;
        }
        if let Some(v) = self.diet_preference {
            fields.diet_preference = v;
        }
        if let Some(v) = self.meals_per_day {
            fields.meals_per_day = v;
        }
        if let Some(v) = self.snacks_per_day {
            fields.snacks_per_day = v;
        }
        if let Some(v) = self.location_culture {
            fields.location_culture = v;
        }

        // Optional fields: only overwrite when a value is supplied.
        fields.target_weight_kg = self.target_weight_kg.or(fields.target_weight_kg);
        fields.medical_conditions = self.medical_conditions.or(fields.medical_conditions.take());
        fields.food_allergies = self.food_allergies.or(fields.food_allergies.take());
        fields.time_per_workout_min = self.time_per_workout_min.or(fields.time_per_workout_min);
        fields.equipment_available = self
            .equipment_available
            .or(fields.equipment_available.take());
        fields.budget_constraint = self.budget_constraint.or(fields.budget_constraint);
        fields.preferred_workout_time = self.preferred_workout_time.or(fields.preferred_workout_time);
    }
}

/// User profile stored in the `profiles` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Profile ID (also used as document ID)
    pub id: Uuid,
    /// Owning user
    pub user_id: u64,
    #[serde(flatten)]
    pub fields: ProfileFields,
    /// Derived from `traits()` and `user_id`; see [`UserProfile::refresh_fingerprint`]
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a new profile with a freshly computed fingerprint.
    pub fn new(user_id: u64, fields: ProfileFields, now: DateTime<Utc>) -> Self {
        let mut profile = Self {
            id: Uuid::new_v4(),
            user_id,
            fields,
            fingerprint: String::new(),
            created_at: now,
            updated_at: now,
        };
        profile.refresh_fingerprint();
        profile
    }

    pub fn traits(&self) -> ProfileTraits {
        ProfileTraits {
            gender: self.fields.gender,
            goal_type: self.fields.goal_type,
            age: self.fields.age,
            height_cm: self.fields.height_cm,
            weight_kg: self.fields.current_weight_kg,
        }
    }

    /// Recompute the fingerprint from the current fields.
    ///
    /// Returns `true` if it changed.
    pub fn refresh_fingerprint(&mut self) -> bool {
        let fresh = fingerprint::compute(self.user_id, &self.traits());
        if fresh == self.fingerprint {
            return false;
        }
        self.fingerprint = fresh;
        true
    }

    /// Apply an update, keeping the fingerprint in sync.
    pub fn apply_update(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        update.apply_to(&mut self.fields);
        self.refresh_fingerprint();
        self.updated_at = now;
    }
}
