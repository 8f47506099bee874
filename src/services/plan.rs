// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan orchestration.
//!
//! Handles the generation workflow:
//! 1. Exact cache check (same fingerprint and plan type)
//! 2. Similarity check (plans generated for close-enough profiles)
//! 3. Generation through the AI gateway, then persistence
//!
//! Concurrent generations for the same fingerprint and plan type are
//! coalesced within this process.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::plan::{CombinedPlan, MealPlan, WorkoutPlan};
use crate::models::{Plan, PlanContent, PlanType, UserProfile};
use crate::services::ai_gateway::{AiGateway, GenerationRequest};
use crate::services::llm::Backend;
use crate::services::prompt::PromptParams;
use crate::services::similarity::{rank_candidates, SimilarPlan, SimilarityBands};

/// Token budget for one plan generation.
pub const MAX_TOKENS: u32 = 4000;
/// Sampling temperature for plan generation.
pub const TEMPERATURE: f32 = 0.7;

/// One lock per (fingerprint, plan type) with a generation in flight.
pub type InFlightLocks = DashMap<(String, PlanType), Arc<Mutex<()>>>;

/// Body of a generation request.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub plan_type: PlanType,
    pub profile_id: Uuid,
    #[serde(default)]
    pub force_regenerate: bool,
    #[serde(default)]
    pub model_preference: Option<Backend>,
}

/// Outcome of a generation request, with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub plan_id: Uuid,
    pub plan_type: PlanType,
    pub from_cache: bool,
    pub similarity_score: f32,
    pub model_used: String,
    pub generation_time_ms: u64,
}

impl GenerationResult {
    fn cached(plan: &Plan, similarity_score: f32) -> Self {
        Self {
            plan_id: plan.id,
            plan_type: plan.plan_type,
            from_cache: true,
            similarity_score,
            model_used: plan.model_used.clone(),
            generation_time_ms: 0,
        }
    }
}

/// Plan metadata without content.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub id: Uuid,
    pub plan_type: PlanType,
    pub similarity_score: f32,
    pub model_used: String,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
}

impl PlanSummary {
    pub fn of(plan: &Plan, now: DateTime<Utc>) -> Self {
        Self {
            id: plan.id,
            plan_type: plan.plan_type,
            similarity_score: plan.similarity_score,
            model_used: plan.model_used.clone(),
            generated_at: plan.generated_at,
            expires_at: plan.expires_at,
            expired: plan.is_expired(now),
        }
    }
}

pub struct PlanService {
    db: Arc<dyn Store>,
    gateway: AiGateway,
    bands: SimilarityBands,
    in_flight: InFlightLocks,
}

impl PlanService {
    pub fn new(db: Arc<dyn Store>, gateway: AiGateway) -> Self {
        Self {
            db,
            gateway,
            bands: SimilarityBands::default(),
            in_flight: DashMap::new(),
        }
    }

    pub fn gateway(&self) -> &AiGateway {
        &self.gateway
    }

    /// Serve a plan for a profile, generating one only when nothing usable
    /// is stored.
    pub async fn generate(
        &self,
        user_id: u64,
        request: &GenerateRequest,
    ) -> Result<GenerationResult> {
        let profile = match self.db.get_profile(request.profile_id).await? {
            Some(profile) if profile.user_id == user_id => profile,
            _ => return Err(AppError::ProfileNotFound(request.profile_id.to_string())),
        };
        let plan_type = request.plan_type;

        tracing::info!(
            user_id,
            profile_id = %profile.id,
            plan_type = %plan_type,
            force = request.force_regenerate,
            "Plan requested"
        );

        if !request.force_regenerate {
            // ─────────────────────────────────────────────────────────
            // STEP 1: Exact cache check
            // ─────────────────────────────────────────────────────────
            if let Some(plan) = self.exact_hit(&profile.fingerprint, plan_type).await? {
                tracing::info!(plan_id = %plan.id, "Exact cache hit");
                return Ok(GenerationResult::cached(&plan, plan.similarity_score));
            }

            // ─────────────────────────────────────────────────────────
            // STEP 2: Similarity check
            // ─────────────────────────────────────────────────────────
            if let Some(similar) = self.best_similar(&profile, plan_type).await? {
                tracing::info!(
                    plan_id = %similar.plan.id,
                    score = similar.score,
                    "Similar profile cache hit"
                );
                return Ok(GenerationResult::cached(&similar.plan, similar.score));
            }
        }

        // ─────────────────────────────────────────────────────────────
        // STEP 3: Acquire the in-flight lock for this fingerprint
        // ─────────────────────────────────────────────────────────────
        // Concurrent requests for the same profile state wait here and
        // pick up the plan the first one persists.
        let key = (profile.fingerprint.clone(), plan_type);
        let lock = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.generate_locked(&profile, request).await
        };

        // Drop the entry unless another task is holding or waiting on it.
        self.in_flight
            .remove_if(&key, |_, entry| Arc::strong_count(entry) <= 2);

        result
    }

    async fn generate_locked(
        &self,
        profile: &UserProfile,
        request: &GenerateRequest,
    ) -> Result<GenerationResult> {
        let plan_type = request.plan_type;

        // Another task may have generated while we were waiting.
        if !request.force_regenerate {
            if let Some(plan) = self.exact_hit(&profile.fingerprint, plan_type).await? {
                tracing::debug!(plan_id = %plan.id, "Plan generated by concurrent request");
                return Ok(GenerationResult::cached(&plan, plan.similarity_score));
            }
        }

        // ─────────────────────────────────────────────────────────────
        // STEP 4: Generate and persist
        // ─────────────────────────────────────────────────────────────
        let start = Instant::now();
        let output = self
            .gateway
            .generate(&GenerationRequest {
                plan_type,
                params: profile_params(profile),
                max_tokens: MAX_TOKENS,
                temperature: TEMPERATURE,
                preferred: request.model_preference,
                bypass_cache: request.force_regenerate,
            })
            .await?;
        let generation_time_ms = start.elapsed().as_millis() as u64;

        let model_used = output.model_label();
        let plan = Plan::generated(
            profile.user_id,
            profile.fingerprint.clone(),
            profile.traits(),
            output.content,
            model_used,
            Utc::now(),
        );
        self.db.insert_plan(&plan).await?;

        tracing::info!(
            plan_id = %plan.id,
            plan_type = %plan_type,
            backend = %output.backend,
            generation_time_ms,
            "Plan generated"
        );

        Ok(GenerationResult {
            plan_id: plan.id,
            plan_type,
            from_cache: false,
            similarity_score: plan.similarity_score,
            model_used: plan.model_used,
            generation_time_ms,
        })
    }

    /// Most recent non-expired plan for exactly this fingerprint.
    async fn exact_hit(&self, fingerprint: &str, plan_type: PlanType) -> Result<Option<Plan>> {
        let now = Utc::now();
        Ok(self
            .db
            .plans_for_fingerprint(fingerprint, plan_type)
            .await?
            .into_iter()
            .find(|plan| !plan.is_expired(now)))
    }

    async fn best_similar(
        &self,
        profile: &UserProfile,
        plan_type: PlanType,
    ) -> Result<Option<SimilarPlan>> {
        let traits = profile.traits();
        let candidates = self
            .db
            .similar_plan_candidates(&traits, plan_type, &self.bands)
            .await?;

        Ok(rank_candidates(&traits, plan_type, candidates, &self.bands, Utc::now())
            .into_iter()
            .next())
    }

    // ─── Reads ───────────────────────────────────────────────────

    /// A plan by ID. Any authenticated user may read a plan they were served.
    pub async fn get(&self, plan_id: Uuid) -> Result<Plan> {
        self.db
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| AppError::PlanNotFound(plan_id.to_string()))
    }

    pub async fn meal_view(&self, plan_id: Uuid) -> Result<MealPlan> {
        let plan = self.get(plan_id).await?;
        plan.content
            .meal()
            .cloned()
            .ok_or_else(|| AppError::PlanNotFound(format!("{} has no meal plan", plan_id)))
    }

    pub async fn workout_view(&self, plan_id: Uuid) -> Result<WorkoutPlan> {
        let plan = self.get(plan_id).await?;
        plan.content
            .workout()
            .cloned()
            .ok_or_else(|| AppError::PlanNotFound(format!("{} has no workout plan", plan_id)))
    }

    pub async fn combined_view(&self, plan_id: Uuid) -> Result<CombinedPlan> {
        match self.get(plan_id).await?.content {
            PlanContent::Combined(combined) => Ok(combined),
            _ => Err(AppError::PlanNotFound(format!(
                "{} is not a combined plan",
                plan_id
            ))),
        }
    }

    /// Non-expired plans generated for any of the user's current profiles.
    pub async fn active_for_user(&self, user_id: u64) -> Result<Vec<PlanSummary>> {
        let fingerprints: Vec<String> = self
            .db
            .profiles_for_user(user_id)
            .await?
            .into_iter()
            .map(|p| p.fingerprint)
            .collect();

        let now = Utc::now();
        Ok(self
            .db
            .plans_for_user(user_id)
            .await?
            .iter()
            .filter(|plan| !plan.is_expired(now) && fingerprints.contains(&plan.fingerprint))
            .map(|plan| PlanSummary::of(plan, now))
            .collect())
    }

    /// Delete a plan owned by `user_id`.
    pub async fn delete(&self, user_id: u64, plan_id: Uuid) -> Result<()> {
        let plan = self.get(plan_id).await?;
        if plan.user_id != user_id {
            return Err(AppError::Forbidden(
                "plan was generated for another user".to_string(),
            ));
        }

        if !self.db.delete_plan(plan_id).await? {
            return Err(AppError::PlanNotFound(plan_id.to_string()));
        }
        tracing::info!(user_id, plan_id = %plan_id, "Plan deleted");
        Ok(())
    }
}

/// Prompt parameters derived from a profile.
///
/// Enum values use their wire names (e.g. `WEIGHT_LOSS`).
pub fn profile_params(profile: &UserProfile) -> PromptParams {
    let f = &profile.fields;
    let mut params = PromptParams::new();
    let mut set = |name: &str, value: Option<String>| {
        params.insert(name.to_string(), value);
    };

    set("gender", Some(label(&f.gender)));
    set("age", Some(f.age.to_string()));
    set("height", Some(f.height_cm.to_string()));
    set("current_weight", Some(f.current_weight_kg.to_string()));
    set("target_weight", f.target_weight_kg.map(|w| w.to_string()));
    set("goal_type", Some(label(&f.goal_type)));
    set("training_experience", Some(label(&f.training_experience)));
    set("training_location", Some(label(&f.training_location)));
    set("days_per_week", Some(f.days_per_week.to_string()));
    set("diet_preference", Some(label(&f.diet_preference)));
    set("meals_per_day", Some(f.meals_per_day.to_string()));
    set("snacks_per_day", Some(f.snacks_per_day.to_string()));
    set("location_culture", Some(f.location_culture.clone()));
    set("medical_conditions", f.medical_conditions.clone());
    set("food_allergies", f.food_allergies.clone());
    set("time_per_workout", f.time_per_workout_min.map(|m| m.to_string()));
    set("equipment_available", f.equipment_available.clone());
    set("budget_constraints", f.budget_constraint.as_ref().map(label));
    set("preferred_workout_time", f.preferred_workout_time.as_ref().map(label));

    params
}

fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}
