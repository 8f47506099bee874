// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer.
//!
//! Services talk to a [`Store`]; production uses Firestore and local runs
//! and tests use the in-memory implementation.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    BodyMeasurement, DailyTracking, Plan, PlanType, ProfileTraits, PromptTemplate, UserProfile,
    WorkoutEntry,
};
use crate::services::similarity::SimilarityBands;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

/// Collection names as constants.
pub mod collections {
    pub const PROFILES: &str = "profiles";
    pub const PLANS: &str = "plans";
    pub const PROMPT_TEMPLATES: &str = "prompt_templates";
    pub const DAILY_TRACKING: &str = "daily_tracking";
    pub const BODY_MEASUREMENTS: &str = "body_measurements";
    pub const WORKOUT_HISTORY: &str = "workout_history";
}

/// Persistent storage for profiles, plans, prompt templates and progress
/// tracking.
///
/// List operations return rows newest first (by `updated_at` for profiles,
/// `generated_at` for plans). Tracking ranges are inclusive and come back
/// oldest first.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Profiles ───────────────────────────────────────────────

    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>>;

    async fn profiles_for_user(&self, user_id: u64) -> Result<Vec<UserProfile>>;

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()>;

    // ─── Plans ──────────────────────────────────────────────────

    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>>;

    /// All plans (expired included) for a fingerprint and type.
    async fn plans_for_fingerprint(
        &self,
        fingerprint: &str,
        plan_type: PlanType,
    ) -> Result<Vec<Plan>>;

    async fn plans_for_user(&self, user_id: u64) -> Result<Vec<Plan>>;

    /// Coarse candidate set for similarity matching.
    ///
    /// Filters on plan type, gender, goal and the age window. Callers apply
    /// the full predicate with [`SimilarityBands::matches`].
    async fn similar_plan_candidates(
        &self,
        traits: &ProfileTraits,
        plan_type: PlanType,
        bands: &SimilarityBands,
    ) -> Result<Vec<Plan>>;

    async fn insert_plan(&self, plan: &Plan) -> Result<()>;

    /// Returns `false` if the plan did not exist.
    async fn delete_plan(&self, id: Uuid) -> Result<bool>;

    // ─── Prompt Templates ───────────────────────────────────────

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>>;

    async fn get_template(&self, id: Uuid) -> Result<Option<PromptTemplate>>;

    /// Highest-version active template for a plan type.
    async fn active_template(&self, plan_type: PlanType) -> Result<Option<PromptTemplate>>;

    async fn upsert_template(&self, template: &PromptTemplate) -> Result<()>;

    // ─── Progress Tracking ──────────────────────────────────────

    async fn get_daily_tracking(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<DailyTracking>>;

    async fn upsert_daily_tracking(&self, entry: &DailyTracking) -> Result<()>;

    async fn daily_tracking_between(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyTracking>>;

    async fn get_body_measurement(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<BodyMeasurement>>;

    async fn upsert_body_measurement(&self, measurement: &BodyMeasurement) -> Result<()>;

    async fn body_measurements_between(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BodyMeasurement>>;

    async fn insert_workout_entry(&self, entry: &WorkoutEntry) -> Result<()>;

    async fn workout_entries_between(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutEntry>>;

    // ─── Account ────────────────────────────────────────────────

    /// Delete every profile, plan and tracking record owned by a user.
    ///
    /// Returns the number of documents deleted.
    async fn delete_user_data(&self, user_id: u64) -> Result<usize>;
}

/// Sort plans newest first.
pub(crate) fn newest_plans_first(plans: &mut [Plan]) {
    plans.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
}

/// Sort profiles most recently updated first.
pub(crate) fn newest_profiles_first(profiles: &mut [UserProfile]) {
    profiles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Sort workouts oldest first; same-day entries in the order they were logged.
pub(crate) fn oldest_workouts_first(entries: &mut [WorkoutEntry]) {
    entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
}
